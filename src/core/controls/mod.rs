pub mod time_control;
