pub mod players;
pub mod roster;
pub mod teams;
pub mod tryouts;
