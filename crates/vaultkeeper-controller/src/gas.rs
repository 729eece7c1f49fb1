//! Gas estimate padding

use ruint::aliases::U256;

use vaultkeeper_types::{Result, VaultError};

/// Units added on top of an estimate
pub const GAS_BUFFER: u64 = 100_000;

/// Add [`GAS_BUFFER`] to a hex gas quantity and return it `0x`-prefixed
///
/// The prefix is optional on input. An empty quantity counts as zero.
pub fn add_gas_buffer(gas: &str) -> Result<String> {
    let trimmed = gas.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(VaultError::validation("gas", format!("not a hex quantity: {}", gas)));
    }

    let value = if digits.is_empty() {
        U256::ZERO
    } else {
        U256::from_str_radix(digits, 16)
            .map_err(|_| VaultError::validation("gas", format!("not a hex quantity: {}", gas)))?
    };

    let buffered = value
        .checked_add(U256::from(GAS_BUFFER))
        .ok_or_else(|| VaultError::validation("gas", "quantity overflows 256 bits"))?;

    Ok(format!("{:#x}", buffered))
}
