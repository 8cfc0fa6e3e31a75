pub mod api_send_record;
pub mod db_send_record;
pub mod new_send_record;
