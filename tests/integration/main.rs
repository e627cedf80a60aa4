mod common;
mod e2e_test;
mod properties;
mod replay_test;
