//! Vendor / product lookup table
//!
//! Many cheap label printers report no product string. Names then come
//! from this table so discovery never shows an anonymous device for a vendor
//! we know.

/// (vendor id, vendor name)
const VENDORS: &[(u16, &str)] = &[
    (0x0416, "Winbond"),
    (0x0483, "STMicroelectronics"),
    (0x04b8, "Epson"),
    (0x0519, "Star Micronics"),
    (0x0a5f, "Zebra"),
    (0x0dd4, "Custom"),
    (0x0fe6, "ICS Advent"),
    (0x1203, "TSC"),
    (0x1504, "Bixolon"),
    (0x154f, "SNBC"),
    (0x1fc9, "NXP"),
    (0x20d1, "Xprinter"),
    (0x2d37, "Rongta"),
    (0x28e9, "GD32"),
    (0x6868, "Gprinter"),
];

/// (vendor id, product id, product name)
const PRODUCTS: &[(u16, u16, &str)] = &[
    (0x0416, 0x5011, "Thermal Label Printer"),
    (0x0483, 0x5720, "Thermal Label Printer"),
    (0x0a5f, 0x0081, "GK420d"),
    (0x0a5f, 0x00d1, "ZD410"),
    (0x0fe6, 0x811e, "Thermal Label Printer"),
    (0x1203, 0x0230, "TTP-244 Pro"),
    (0x1203, 0x0233, "TDP-225"),
    (0x1203, 0x0242, "TE200"),
    (0x1203, 0x0341, "DA200"),
    (0x1504, 0x0006, "SLP-TX400"),
    (0x2d37, 0x62cc, "RP410"),
    (0x6868, 0x0200, "GP-1324D"),
    (0x6868, 0x0500, "GP-3120TU"),
];

pub fn lookup_vendor(vendor_id: u16) -> Option<&'static str> {
    VENDORS
        .iter()
        .find(|(v, _)| *v == vendor_id)
        .map(|(_, name)| *name)
}

pub fn lookup_product(vendor_id: u16, product_id: u16) -> Option<&'static str> {
    PRODUCTS
        .iter()
        .find(|(v, p, _)| *v == vendor_id && *p == product_id)
        .map(|(_, _, name)| *name)
}

/// Display name for a USB device
///
/// Order: reported product string, table product (prefixed with the
/// vendor), "<vendor> label printer", then the raw ids.
pub fn resolve_name(vendor_id: u16, product_id: u16, reported: Option<&str>) -> String {
    if let Some(product) = reported.map(str::trim).filter(|s| !s.is_empty()) {
        return product.to_string();
    }
    match (lookup_vendor(vendor_id), lookup_product(vendor_id, product_id)) {
        (Some(vendor), Some(product)) => format!("{} {}", vendor, product),
        (None, Some(product)) => product.to_string(),
        (Some(vendor), None) => format!("{} label printer", vendor),
        (None, None) => format!("USB printer {:04x}:{:04x}", vendor_id, product_id),
    }
}

/// Whether a vendor is in the table at all
pub(crate) fn is_known_vendor(vendor_id: u16) -> bool {
    lookup_vendor(vendor_id).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reported_name_wins() {
        assert_eq!(resolve_name(0x1203, 0x0230, Some("My Printer")), "My Printer");
    }

    #[test]
    fn test_table_fallbacks() {
        assert_eq!(resolve_name(0x1203, 0x0230, None), "TSC TTP-244 Pro");
        assert_eq!(resolve_name(0x1203, 0xffff, Some("")), "TSC label printer");
        assert_eq!(resolve_name(0xdead, 0xbeef, None), "USB printer dead:beef");
    }

    #[test]
    fn test_every_known_vendor_gets_a_name() {
        for (vendor, _) in VENDORS {
            let name = resolve_name(*vendor, 0x0001, None);
            assert!(!name.trim().is_empty());
            assert!(is_known_vendor(*vendor));
        }
    }
}
