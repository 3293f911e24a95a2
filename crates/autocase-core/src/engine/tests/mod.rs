pub mod serializer_tests;
