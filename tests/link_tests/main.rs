//! Poll worker test suite

mod config_tests;
