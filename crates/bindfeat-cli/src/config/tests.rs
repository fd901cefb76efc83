#[cfg(test)]
mod tests {
    use super::super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("bindfeat").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags_build_config() {
        let cli = parse(&[
            "-p", "p1.csv", "p2.csv",
            "--docking", "docking.csv",
            "-m", "MolecularDescriptors.tsv",
            "--descriptor-key", "NAME",
            "--feats", "keep.txt",
            "--out-dir", "out",
            "-o", "full",
        ]);
        let config = cli.into_config().unwrap();
        assert_eq!(config.sources.protein.len(), 2);
        assert_eq!(config.sources.protein[1].path, PathBuf::from("p2.csv"));
        assert_eq!(
            config.sources.descriptors.as_ref().unwrap().key.as_deref(),
            Some("NAME")
        );
        assert_eq!(config.descriptor_allow_list, Some(PathBuf::from("keep.txt")));
        assert_eq!(config.output.dir, PathBuf::from("out"));
        assert_eq!(config.output.name, "full");
        assert!(config.output.manifests);
        assert!(config.strict_keys);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bindfeat.toml");
        std::fs::write(
            &path,
            r#"
                strict_keys = true

                [[sources.protein]]
                path = "from_file.csv"
                key = "Cluster_Name"

                [sources.docking]
                path = "docking_from_file.csv"

                [sources.descriptors]
                path = "descriptors.tsv"

                [output]
                name = "from_file"
            "#,
        )
        .unwrap();

        let cli = parse(&[
            "--config", path.to_str().unwrap(),
            "--docking", "docking_cli.csv",
            "--descriptor-key", "NAME",
            "--no-manifests",
            "--lenient-keys",
        ]);
        let config = cli.into_config().unwrap();
        // Untouched file values survive
        assert_eq!(config.sources.protein[0].key.as_deref(), Some("Cluster_Name"));
        assert_eq!(config.output.name, "from_file");
        // Flags win
        assert_eq!(
            config.sources.docking.unwrap().path,
            PathBuf::from("docking_cli.csv")
        );
        assert_eq!(config.sources.descriptors.unwrap().key.as_deref(), Some("NAME"));
        assert!(!config.output.manifests);
        assert!(!config.strict_keys);
    }

    #[test]
    fn test_protein_key_applies_to_every_table() {
        let cli = parse(&["-p", "a.csv", "b.csv", "--protein-key", "Cluster_Name", "--docking", "d.csv"]);
        let config = cli.into_config().unwrap();
        let keys: Vec<_> = config.sources.protein.iter().map(|s| s.key.as_deref()).collect();
        assert_eq!(keys, vec![Some("Cluster_Name"), Some("Cluster_Name")]);
    }

    #[test]
    fn test_protein_keys_pair_with_tables_in_order() {
        let cli = parse(&[
            "-p", "2struc.csv", "coach.csv",
            "--protein-key", "Cluster_Name", "cluster_name",
            "--docking", "d.csv",
        ]);
        let config = cli.into_config().unwrap();
        let keys: Vec<_> = config.sources.protein.iter().map(|s| s.key.as_deref()).collect();
        assert_eq!(keys, vec![Some("Cluster_Name"), Some("cluster_name")]);
    }

    #[test]
    fn test_protein_key_count_mismatch_is_error() {
        let cli = parse(&["-p", "a.csv", "b.csv", "c.csv", "--protein-key", "x", "y"]);
        assert!(cli.into_config().is_err());
    }

    #[test]
    fn test_missing_config_file_is_error() {
        let cli = parse(&["--config", "/nonexistent/bindfeat.toml"]);
        let err = cli.into_config().unwrap_err();
        assert!(format!("{err:#}").contains("bindfeat.toml"));
    }
}
