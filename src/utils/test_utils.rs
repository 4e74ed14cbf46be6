//! Test utilities for register and condition tests.
