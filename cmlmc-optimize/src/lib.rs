/// Least-squares regression of power laws in logarithmic space
pub mod regression;
