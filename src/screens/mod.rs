//! Screen state for the front end. Layout lives elsewhere; these types hold what
//! each screen shows and the messages it raises.
mod auth;
mod details;
mod profile;
mod suggestions;

pub use auth::{SignInForm, SignUpForm, ACCOUNT_CREATED};
pub use details::MovieDetails;
pub use profile::ProfileScreen;
pub use suggestions::{Outcome, SuggestionsScreen, SuggestionsState};
