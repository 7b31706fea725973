/// Prefixes of mainnet, testnet, signet and regtest addresses.
pub const ADDRESS_PREFIXES: [&str; 8] = ["bc1", "1", "3", "bcr", "tb1", "m", "n", "2"];

/// Cheap syntactic pre-filter. Checksums and network membership are left
/// to the data provider, so false positives are expected.
pub fn validate_address(candidate: &str) -> bool {
    !candidate.is_empty()
        && ADDRESS_PREFIXES
            .iter()
            .any(|prefix| candidate.starts_with(prefix))
}
