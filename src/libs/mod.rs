pub mod edge;
pub mod error;
pub mod graph;
pub mod io;
pub mod linkage;
pub mod psl;
pub mod read_name;
pub mod source;
