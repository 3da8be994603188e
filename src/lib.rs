pub mod ir;
pub mod util;

// Concrete execution over sea-of-nodes graphs
pub mod interp;
