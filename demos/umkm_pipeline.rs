use rockfuse::{Pipeline, PipelineConfig, RecordTable};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A small UMKM survey with three business profiles and the usual
    // inconsistent casing in the free-text columns.
    let table = RecordTable::new()
        .with_numeric(
            "capital",
            vec![5.0, 6.5, 5.5, 7.0, 40.0, 45.0, 42.0, 48.0, 15.0, 16.0, 14.5, 15.5],
        )
        .with_numeric(
            "revenue",
            vec![1.5, 1.8, 1.6, 2.0, 9.0, 10.5, 9.8, 11.0, 4.0, 4.2, 3.9, 4.1],
        )
        .with_numeric(
            "workforce",
            vec![2.0, 2.0, 1.0, 3.0, 10.0, 12.0, 11.0, 14.0, 5.0, 4.0, 5.0, 6.0],
        )
        .with_text(
            "business_type",
            vec![
                "Kuliner", "kuliner", "KULINER ", "kuliner", "fashion", "Fashion", "fashion",
                "fashion", "kerajinan", "Kerajinan", "kerajinan", "kerajinan",
            ],
        )
        .with_text(
            "uses_ride_hailing",
            vec![
                "Ya", "ya", "ya", "ya", "tidak", "Tidak", "tidak", "ya", "tidak", "tidak",
                "tidak", "Tidak",
            ],
        );

    // Same grid as the defaults, but ties go to the smaller cluster count.
    let config = PipelineConfig::from_json_str(
        r#"{
            "numeric": { "tie_break": "fewer_clusters" },
            "categorical": { "tie_break": "fewer_clusters" },
            "ensemble": { "thetas": [0.05, 0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9] }
        }"#,
    )?;

    let report = Pipeline::new(config).run(&table)?;

    println!(
        "numeric:     linkage={} k={} pseudo_f={:.3} icd={:.4}",
        report.numeric.linkage,
        report.numeric.k,
        report.numeric.score.pseudo_f,
        report.numeric.score.icd
    );
    println!(
        "categorical: theta={} k={} cp*={:.4}",
        report.categorical.theta, report.categorical.k, report.categorical.cp_star
    );
    println!(
        "ensemble:    theta={} k={} cp*={:.4} ari(numeric)={:.3} ari(categorical)={:.3}",
        report.ensemble.link.theta,
        report.ensemble.link.k,
        report.ensemble.link.cp_star,
        report.ensemble.agreement_numeric,
        report.ensemble.agreement_categorical
    );

    println!("\nrecord  numeric  categorical  ensemble");
    for row in report.rows() {
        println!(
            "{:>6}  {:>7}  {:>11}  {:>8}",
            row.record + 1,
            row.numeric,
            row.categorical,
            row.ensemble
        );
    }

    println!("\n{}", report.to_json()?);
    Ok(())
}
