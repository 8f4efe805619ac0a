use dive_deco_planner::{
    build_profiles, DiveParameters, Gas, GasList, MultiProfileTable, Profile, Segment,
};

fn gradient_factor_profiles() -> Vec<Profile> {
    let configurations = [
        DiveParameters::new(0.85, 0.3),
        DiveParameters::new(0.8, 0.5),
        DiveParameters::new(1.0, 1.0),
    ];
    let mut gases = GasList::new();
    let air = gases.push(Gas::air(&configurations[0]));
    let plan = [Segment::dive(45.0, 25.0, air, 0.0)];
    build_profiles(&configurations, &gases, &plan).unwrap()
}

#[test]
fn test_table_alignment() {
    let profiles = gradient_factor_profiles();
    let table = MultiProfileTable::new(&profiles);

    let lengths: Vec<usize> = profiles.iter().map(|p| p.segments().len()).collect();
    let longest = table.longest_profile();
    assert_eq!(table.rows(), *lengths.iter().max().unwrap());
    assert_eq!(lengths[longest], table.rows());
    assert!(lengths[..longest].iter().all(|&len| len < table.rows()));
    assert_eq!(table.columns(), 3);

    for row in 0..table.rows() {
        assert_eq!(
            table.row_depth(row),
            Some(profiles[longest].segments()[row].depth)
        );
        for (column, len) in lengths.iter().enumerate() {
            let run_time = table.run_time(row, column);
            if row < *len {
                assert_eq!(run_time, Some(profiles[column].segments()[row].run_time));
            } else {
                assert_eq!(run_time, None);
                assert!(table.cell(row, column).is_none());
            }
        }
    }
    assert_eq!(table.row_depth(table.rows()), None);
}

#[test]
fn test_table_aggregates() {
    let profiles = gradient_factor_profiles();
    let table = MultiProfileTable::new(&profiles);

    let max_pp_o2 = profiles.iter().map(|p| p.max_pp_o2()).fold(0.0, f64::max);
    assert_eq!(table.max_pp_o2(), max_pp_o2);
    assert!(!table.pp_o2_warning(1.6));
    assert!(table.pp_o2_warning(1.0));
    assert!(table.max_cns() > 0.0);
    assert!(!table.cns_warning());
}

#[test]
fn test_longest_profile_tie_goes_to_first() {
    let params = DiveParameters::default();
    let mut gases = GasList::new();
    let air = gases.push(Gas::air(&params));
    let plan = [Segment::dive(18.0, 20.0, air, 0.0)];
    let profiles = build_profiles(&[params, params], &gases, &plan).unwrap();
    assert_eq!(MultiProfileTable::new(&profiles).longest_profile(), 0);
}

#[test]
fn test_build_profiles_fails_atomically() {
    let mut gases = GasList::new();
    let air = gases.push(Gas::air(&DiveParameters::default()));
    let plan = [Segment::dive(30.0, 20.0, air, 0.0)];
    let result = build_profiles(
        &[DiveParameters::default(), DiveParameters::new(0.3, 0.85)],
        &gases,
        &plan,
    );
    assert!(result.is_err());
}

#[cfg(feature = "std")]
#[test]
fn export_table_csv() {
    use csv::Writer;
    use std::string::ToString;

    let profiles = gradient_factor_profiles();
    let table = MultiProfileTable::new(&profiles);

    std::fs::create_dir_all("test_output").unwrap();
    let mut wtr = Writer::from_path("test_output/gf_comparison.csv").unwrap();
    let mut header = vec!["depth".to_string()];
    header.extend(profiles.iter().map(|p| {
        format!(
            "gf_{:.0}_{:.0}",
            p.params().gf_low * 100.0,
            p.params().gf_high * 100.0
        )
    }));
    wtr.write_record(&header).unwrap();

    for row in table.to_rows() {
        let mut record = vec![row.depth.to_string()];
        record.extend(
            row.run_times
                .iter()
                .map(|t| t.map(|t| format!("{t:.1}")).unwrap_or_default()),
        );
        wtr.write_record(&record).unwrap();
    }
    wtr.flush().unwrap();

    let mut rdr = csv::Reader::from_path("test_output/gf_comparison.csv").unwrap();
    assert_eq!(rdr.records().count(), table.rows());
}
