mod card;
mod character;
mod journal;
mod ledger;
mod shuffle;

pub use card::*;
pub use character::*;
pub use journal::*;
pub use ledger::*;
pub use shuffle::*;
