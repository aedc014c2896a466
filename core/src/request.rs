/// The narrow slice of an in-flight HTTP transaction the core needs to make
/// a selection decision.
///
/// The proxy owns the real transaction object (headers, timing, I/O); this
/// trait is the seam the core reads through so it never has to parse HTTP
/// itself.
pub trait RequestContext {
    /// A stable byte key the strategy hashes to derive the request
    /// fingerprint — e.g. `host + path`, or a configured header's value.
    /// Must be deterministic for logically-equivalent retries of the same
    /// transaction.
    fn fingerprint_key(&self) -> &[u8];

    /// An opaque identifier for the transaction, used only for diagnostics
    /// (logging/tracing spans); the core does not use it for selection.
    fn transaction_id(&self) -> u64;
}
