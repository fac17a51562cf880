pub mod accumulator;
pub mod grouping;
pub mod guards;
pub mod keys;
pub mod ordering;
pub mod summary;
