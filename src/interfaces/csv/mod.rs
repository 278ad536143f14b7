pub mod airline_writer;
pub mod operation_reader;
