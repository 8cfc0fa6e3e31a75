pub mod api_smtp_config;
pub mod db_smtp_config;
pub mod smtp_config_input;
