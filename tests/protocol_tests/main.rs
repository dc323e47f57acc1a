//! Protocol test suite

mod dispatch_tests;
mod instruction_tests;
