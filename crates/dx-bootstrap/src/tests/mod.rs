//! Test suites for the front-end bootstrap.

mod support;
mod unit;
