pub mod drc;
