//! Human-readable output

use std::fmt::Write;

use domain::ModelVariant;

/// Table of every variant with its artifact and sampling policy
pub fn variant_table() -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<10} {:<12} {:<52} {:<7} SAMPLING",
        "VARIANT", "NAME", "MODEL", "QUANT"
    );

    for variant in ModelVariant::ALL {
        let profile = variant.profile();
        let sampling = if profile.sampling.do_sample {
            format!(
                "temperature={} top_k={}",
                profile.sampling.temperature.unwrap_or_default(),
                profile.sampling.top_k.unwrap_or_default()
            )
        } else {
            "greedy".to_string()
        };
        let _ = writeln!(
            out,
            "{:<10} {:<12} {:<52} {:<7} {sampling}",
            variant.config_key(),
            variant.display_name(),
            profile.model_id,
            profile.quantization,
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_lists_every_variant() {
        let table = variant_table();
        assert_eq!(table.lines().count(), ModelVariant::ALL.len() + 1);
        for variant in ModelVariant::ALL {
            assert!(table.contains(variant.profile().model_id));
        }
    }

    #[test]
    fn only_phi_samples() {
        let table = variant_table();
        let phi = table.lines().find(|l| l.starts_with("phi")).unwrap();
        assert!(phi.contains("top_k=3"));
        let llama = table.lines().find(|l| l.starts_with("llama")).unwrap();
        assert!(llama.ends_with("greedy"));
    }
}
