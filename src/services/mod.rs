pub mod prompt;
pub mod providers;
pub mod recommendations;
pub mod testing_results;
