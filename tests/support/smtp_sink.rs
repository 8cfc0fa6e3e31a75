//! In-process SMTP server that accepts AUTH PLAIN/LOGIN and captures DATA.
//!
//! Supports EHLO/HELO, AUTH, MAIL FROM, RCPT TO, DATA, RSET, NOOP, QUIT.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use std::{
    net::SocketAddr,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::{TcpListener, TcpStream},
};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Clone)]
pub struct CapturedMessage {
    pub mail_from: Option<String>,
    pub rcpts: Vec<String>,
    pub data: Vec<u8>,
}

#[derive(Clone)]
pub struct SmtpSink {
    pub addr: SocketAddr,
    user: String,
    pass: String,
    messages: Arc<Mutex<Vec<CapturedMessage>>>,
    sessions: Arc<AtomicUsize>,
}

impl SmtpSink {
    /// Listen on an ephemeral port, requiring `user`/`pass` before MAIL FROM.
    pub async fn start(user: &str, pass: &str) -> SmtpSink {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let sink = SmtpSink {
            addr: listener.local_addr().unwrap(),
            user: user.to_string(),
            pass: pass.to_string(),
            messages: Arc::default(),
            sessions: Arc::default(),
        };
        let accept = sink.clone();
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                accept.sessions.fetch_add(1, Ordering::SeqCst);
                let conn = accept.clone();
                tokio::spawn(async move {
                    let _ = conn.handle_client(stream).await;
                });
            }
        });
        sink
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub fn messages(&self) -> Vec<CapturedMessage> {
        self.messages.lock().unwrap().clone()
    }

    /// Number of TCP sessions accepted so far.
    pub fn sessions(&self) -> usize {
        self.sessions.load(Ordering::SeqCst)
    }

    fn check(&self, user: &str, pass: &str) -> bool {
        user == self.user && pass == self.pass
    }

    async fn handle_client(&self, stream: TcpStream) -> Result<(), BoxError> {
        let (read_half, mut writer) = stream.into_split();
        let mut reader = BufReader::new(read_half);
        writer.write_all(b"220 mailroom test sink\r\n").await?;
        writer.flush().await?;

        let mut authed = false;
        let mut mail_from: Option<String> = None;
        let mut rcpts: Vec<String> = Vec::new();
        let mut buf = String::new();

        loop {
            buf.clear();
            let n = reader.read_line(&mut buf).await?;
            if n == 0 {
                break;
            }
            let line = buf.trim_end_matches(['\r', '\n']).to_string();
            let upper = line.to_uppercase();

            if upper.starts_with("EHLO") || upper.starts_with("HELO") {
                writer.write_all(b"250-mailroom-sink\r\n").await?;
                writer.write_all(b"250-AUTH PLAIN LOGIN\r\n").await?;
                writer.write_all(b"250 OK\r\n").await?;
            } else if upper.starts_with("AUTH PLAIN") {
                let token = line.split_whitespace().nth(2).unwrap_or("");
                let data = B64.decode(token).unwrap_or_default();
                // format: "\0username\0password"
                let mut parts = data.split(|b| *b == 0).skip(1);
                let u = String::from_utf8_lossy(parts.next().unwrap_or_default()).to_string();
                let p = String::from_utf8_lossy(parts.next().unwrap_or_default()).to_string();
                authed = self.check(&u, &p);
                let reply: &[u8] = if authed {
                    b"235 Authentication successful\r\n"
                } else {
                    b"535 Authentication failed\r\n"
                };
                writer.write_all(reply).await?;
            } else if upper.starts_with("AUTH LOGIN") {
                writer.write_all(b"334 VXNlcm5hbWU6\r\n").await?; // 'Username:'
                let mut u = String::new();
                reader.read_line(&mut u).await?;
                let u = B64.decode(u.trim_end()).unwrap_or_default();
                writer.write_all(b"334 UGFzc3dvcmQ6\r\n").await?; // 'Password:'
                let mut p = String::new();
                reader.read_line(&mut p).await?;
                let p = B64.decode(p.trim_end()).unwrap_or_default();
                authed = self.check(&String::from_utf8_lossy(&u), &String::from_utf8_lossy(&p));
                let reply: &[u8] = if authed {
                    b"235 Authentication successful\r\n"
                } else {
                    b"535 Authentication failed\r\n"
                };
                writer.write_all(reply).await?;
            } else if upper.starts_with("MAIL FROM:") {
                if !authed {
                    writer.write_all(b"530 Authentication required\r\n").await?;
                    continue;
                }
                let arg = line[10..].split_whitespace().next().unwrap_or("");
                mail_from = Some(arg.trim_matches(['<', '>']).to_string());
                rcpts.clear();
                writer.write_all(b"250 OK\r\n").await?;
            } else if upper.starts_with("RCPT TO:") {
                let arg = line[8..].split_whitespace().next().unwrap_or("");
                rcpts.push(arg.trim_matches(['<', '>']).to_string());
                writer.write_all(b"250 Accepted\r\n").await?;
            } else if upper == "DATA" {
                writer
                    .write_all(b"354 End data with <CR><LF>.<CR><LF>\r\n")
                    .await?;
                let mut data = Vec::new();
                loop {
                    let mut line = String::new();
                    let n = reader.read_line(&mut line).await?;
                    if n == 0 || line == ".\r\n" || line == ".\n" {
                        break;
                    }
                    data.extend_from_slice(line.as_bytes());
                }
                self.messages.lock().unwrap().push(CapturedMessage {
                    mail_from: mail_from.take(),
                    rcpts: std::mem::take(&mut rcpts),
                    data,
                });
                writer.write_all(b"250 OK queued\r\n").await?;
            } else if upper == "RSET" {
                mail_from = None;
                rcpts.clear();
                writer.write_all(b"250 OK\r\n").await?;
            } else if upper == "NOOP" {
                writer.write_all(b"250 OK\r\n").await?;
            } else if upper == "QUIT" {
                writer.write_all(b"221 Bye\r\n").await?;
                break;
            } else {
                writer.write_all(b"502 Command not implemented\r\n").await?;
            }
        }
        Ok(())
    }
}
