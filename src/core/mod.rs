pub mod compare;
pub mod filter;
pub mod grouping;
pub mod heuristic;
pub mod models;
pub mod pagination;
pub mod selection;
pub mod store;
pub mod virtualize;
