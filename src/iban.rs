use rand::Rng;

/// Bank code (BLZ) identifying this bank inside an IBAN.
pub const BANK_CODE: &str = "12030000";

/// Origin IBAN used for deposits coming from outside the bank.
pub const DEPOSIT_ORIGIN_IBAN: &str = "DE38120300005392125312";

/// Sentinel returned by [`bank_code`] for IBANs it cannot classify.
pub const UNKNOWN_BANK_CODE: &str = "unknown";

/// Static bank-code -> BIC table for the banks we recognize.
const BIC_BY_BANK_CODE: [(&str, &str); 5] = [
    ("12030000", "BYLADEM1001"),
    ("11010101", "SOGEFRPPXXX"),
    ("30003", "SOGEFRPPXXX"),
    ("02008", "UNCRITMMXXX"),
    ("967", "TRWIBEB1"),
];

/// Structural IBAN check by length and country prefix only.
/// Deliberately weak: no ISO-13616 checksum arithmetic.
pub fn is_valid_iban(iban: &str) -> bool {
    match iban.len() {
        27 => iban.starts_with("FR") || iban.starts_with("IT"),
        22 => iban.starts_with("DE"),
        16 => iban.starts_with("BE"),
        _ => false,
    }
}

/// Extracts the country-specific bank code from an IBAN,
/// or [`UNKNOWN_BANK_CODE`] if the prefix is not recognized.
pub fn bank_code(iban: &str) -> &str {
    let range = match iban {
        _ if iban.starts_with("DE") => 4..12,
        _ if iban.starts_with("IT") => 5..10,
        _ if iban.starts_with("FR") => 4..9,
        _ if iban.starts_with("BE") => 4..7,
        _ => return UNKNOWN_BANK_CODE,
    };
    iban.get(range).unwrap_or(UNKNOWN_BANK_CODE)
}

/// An IBAN is internal when it is well-formed and carries our own bank code.
pub fn is_internal_iban(iban: &str) -> bool {
    is_valid_iban(iban) && bank_code(iban) == BANK_CODE
}

/// True iff the lookup table maps the IBAN's bank code to exactly `bic`.
/// An unknown bank code never matches.
pub fn is_valid_bic(bic: &str, iban: &str) -> bool {
    let code = bank_code(iban);
    BIC_BY_BANK_CODE
        .iter()
        .any(|(known_code, known_bic)| *known_code == code && *known_bic == bic)
}

/// Generates a fresh internal DE IBAN for a newly opened account.
pub fn generate_iban() -> String {
    let mut rng = rand::thread_rng();
    let checksum: u32 = rng.gen_range(10..=99);
    let account_number: u64 = rng.gen_range(1_000_000_000..=9_999_999_999);
    format!("DE{checksum}{BANK_CODE}{account_number}")
}
