/// Page retrieval for the forecast site.
///
/// `fetch` talks HTTP, `flatten` turns markup into the line-oriented text the
/// parsers read, and `throttle` keeps requests to one host spaced out.

pub mod fetch;
pub mod flatten;
pub mod throttle;
