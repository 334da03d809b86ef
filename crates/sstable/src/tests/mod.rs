mod entry_tests;
