//! Content-script stubs.
//!
//! Each stub turns one local signal into host traffic through the shared
//! [`ActionForwarder`](crate::ActionForwarder) or [`QueryClient`](crate::QueryClient).
//! Stubs hold no state in common; each owns its own trigger condition.
//!
//! | Stub | Trigger | Host traffic |
//! |------|---------|--------------|
//! | [`IdleStateStub`] | idle/active transition | `app-idle-state-changed` |
//! | [`BlockedScriptNotice`] | page load | `window-set-blocked-by` per script |
//! | [`SpellCheckStub`] | provider callback | `is-misspelled` query |
//! | [`WalletBalanceStub`] | page load, balance event | `app-wallet-balance-requested` |
//! | [`AboutPage`] | page commands | direct host events, two embedder events |

// ============================================================================
// Submodules
// ============================================================================

pub mod about;
pub mod idle;
pub mod scripts;
pub mod spellcheck;
pub mod wallet;

// ============================================================================
// Re-exports
// ============================================================================

pub use about::AboutPage;
pub use idle::{IdleState, IdleStateStub};
pub use scripts::{BlockedScriptNotice, ScriptTag};
pub use spellcheck::SpellCheckStub;
pub use wallet::{BalanceDisplay, WalletBalanceStub};
