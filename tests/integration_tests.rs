mod integration {
    mod cli_tests;
    mod sweep_tests;
    mod transfer_tests;
}
