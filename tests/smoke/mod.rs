mod exit_code_test;
mod mock_services;
mod run_test;
