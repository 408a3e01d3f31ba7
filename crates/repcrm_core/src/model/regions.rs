//! Reference lists offered by the property and client forms.

/// Placeholder entry that opens free-text input instead of being stored.
pub const OTHER_REGION: &str = "Outro";

/// Curitiba metro regions, ending with the [`OTHER_REGION`] placeholder.
pub const REGIONS: &[&str] = &[
    "CIC",
    "Tatuquara",
    "Sítio Cercado",
    "Colombo",
    "Campo Largo",
    "Pinhais",
    "São José dos Pinhais",
    "Araucária",
    "Almirante Tamandaré",
    "Fazenda Rio Grande",
    "Bairro Alto",
    "Boqueirão",
    "Cajuru",
    "Cidade Industrial",
    "Xaxim",
    "Portão",
    "Santa Felicidade",
    "Boa Vista",
    OTHER_REGION,
];

/// Financing banks and builders a repasse contract is usually held with.
pub const BANKS_CONSTRUCTORS: &[&str] = &[
    "Caixa",
    "Banco do Brasil",
    "Bradesco",
    "Itaú",
    "Santander",
    "MRV",
    "Tenda",
    "Direcional",
    "Plano & Plano",
    "Cyrela",
    "Outro",
];

/// Regions selectable as toggles (everything except the placeholder).
pub fn predefined_regions() -> impl Iterator<Item = &'static str> {
    REGIONS.iter().copied().filter(|r| *r != OTHER_REGION)
}

/// Splits a client's regions into the ones typed by hand.
pub fn custom_regions(regions: &[String]) -> Vec<&str> {
    regions
        .iter()
        .map(String::as_str)
        .filter(|region| !REGIONS.contains(region))
        .collect()
}
