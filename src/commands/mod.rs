pub mod calendar;
pub mod check;
