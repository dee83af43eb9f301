//! Historical convergence: discovery of missing or under-validated block ranges and the
//! dispatcher pool that re-ingests them.
//!
//! The gaps table is the only coordination surface between the two halves. The finder inserts
//! ranges behind a unique constraint; dispatchers claim them with an atomic reservation, feed
//! every block through the transform pipeline and retire the range on success. The index
//! therefore converges to a gap-free projection of chain history without any in-process
//! locking.

mod backfill;
mod finder;

pub use backfill::BackfillService;
pub use finder::GapFinder;
