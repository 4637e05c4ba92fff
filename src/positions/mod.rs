pub(crate) mod positions_calculator;

pub use positions_calculator::{shares_at_date, weighted_average_cost};
