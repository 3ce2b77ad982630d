pub mod minizinc_backend;
pub mod minizinc_printer;
