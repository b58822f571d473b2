//! Integration tests for drivepick

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn drivepick() -> Command {
        cargo_bin_cmd!("drivepick")
    }

    /// A local media tree plus a config pointing every path into `dir`
    struct Fixture {
        dir: TempDir,
    }

    impl Fixture {
        fn new(files: &[&str]) -> Self {
            let dir = TempDir::new().unwrap();
            let tree = dir.path().join("tree");
            fs::create_dir_all(&tree).unwrap();
            for file in files {
                let path = tree.join(file);
                if file.ends_with('/') {
                    fs::create_dir_all(&path).unwrap();
                } else {
                    fs::create_dir_all(path.parent().unwrap()).unwrap();
                    fs::write(&path, file.as_bytes()).unwrap();
                }
            }

            let config = format!(
                "[general]\nhistory = true\n\n\
                 [source]\nprovider = \"local\"\nlocal_root = '{}'\n\n\
                 [cache]\nfile = '{}'\n\n\
                 [download]\ndir = '{}'\nkeep = 2\n",
                tree.display(),
                dir.path().join("state").join("cache.json").display(),
                dir.path().join("downloads").display(),
            );
            fs::write(dir.path().join("config.toml"), config).unwrap();
            Self { dir }
        }

        fn path(&self) -> &Path {
            self.dir.path()
        }

        fn cmd(&self) -> Command {
            let mut cmd = drivepick();
            cmd.env("DRIVEPICK_CONFIG", self.path().join("config.toml"))
                .env("XDG_STATE_HOME", self.path().join("xdg-state"))
                .env("XDG_CONFIG_HOME", self.path().join("xdg-config"))
                .env_remove("DRIVEPICK_TOKEN");
            cmd
        }

        /// Files the tool downloaded, recognized by their name prefix
        fn downloads(&self) -> usize {
            fs::read_dir(self.path().join("downloads"))
                .map(|d| {
                    d.filter_map(Result::ok)
                        .filter(|e| e.file_name().to_string_lossy().starts_with("drivepick-"))
                        .count()
                })
                .unwrap_or(0)
        }
    }

    #[test]
    fn help_displays() {
        drivepick()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("random media from a remote folder tree"));
    }

    #[test]
    fn version_displays() {
        drivepick()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("drivepick"));
    }

    #[test]
    fn pick_plain_prints_downloaded_path() {
        let fx = Fixture::new(&["2019/summer/beach.jpg", "2020/cat.png"]);

        let output = fx
            .cmd()
            .args(["pick", "--format", "plain"])
            .output()
            .unwrap();
        assert!(output.status.success());

        let printed = String::from_utf8(output.stdout).unwrap();
        let local = Path::new(printed.trim());
        assert!(local.exists(), "{} missing", local.display());
        assert!(local.starts_with(fx.path().join("downloads")));
    }

    #[test]
    fn pick_json_reports_path_from_root() {
        let fx = Fixture::new(&["2019/summer/beach.jpg"]);

        fx.cmd()
            .args(["pick", "-f", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""path":"2019/summer/beach.jpg""#))
            .stdout(predicate::str::contains(r#""mime_type":"image/jpeg""#));
    }

    #[test]
    fn repeated_picks_rotate_downloads_and_log_history() {
        let fx = Fixture::new(&["a/1.jpg", "a/2.jpg", "b/3.jpg", "b/4.jpg", "c/5.png"]);
        let own = fx.path().join("downloads").join("my-photo.jpg");
        fs::create_dir_all(own.parent().unwrap()).unwrap();
        fs::write(&own, b"mine").unwrap();

        fx.cmd()
            .args(["pick", "--count", "6", "--format", "plain"])
            .assert()
            .success();

        assert!(fx.downloads() <= 2);
        assert!(own.exists(), "unrelated file in the download dir was removed");
        let history = fs::read_to_string(
            fx.path()
                .join("xdg-state")
                .join("drivepick")
                .join("history.log"),
        )
        .unwrap();
        assert_eq!(history.lines().count(), 6);
    }

    #[test]
    fn pick_on_tree_without_files_fails() {
        let fx = Fixture::new(&["empty/", "also-empty/nested/"]);

        fx.cmd()
            .arg("pick")
            .assert()
            .failure()
            .stderr(predicate::str::contains("No media files"));
    }

    #[test]
    fn pick_gives_up_on_unsupported_files() {
        let fx = Fixture::new(&["docs/notes.txt"]);

        fx.cmd()
            .arg("pick")
            .assert()
            .failure()
            .stderr(predicate::str::contains("10 times"))
            .stderr(predicate::str::contains("unsupported file type"));
        assert_eq!(fx.downloads(), 0);
    }

    #[test]
    fn weights_show_subtree_counts() {
        let fx = Fixture::new(&["big/1.jpg", "big/x/2.jpg", "big/x/y/3.jpg", "small/4.jpg"]);

        fx.cmd()
            .args(["weights", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::contains("3\tbig"))
            .stdout(predicate::str::contains("1\tsmall"));
    }

    #[test]
    fn warm_then_cache_info() {
        let fx = Fixture::new(&["a/1.jpg", "a/b/2.jpg", "c/3.jpg"]);

        fx.cmd()
            .arg("warm")
            .assert()
            .success()
            .stdout(predicate::str::contains("Cached 4 folders with 3 files"));

        fx.cmd()
            .args(["cache", "info"])
            .assert()
            .success()
            .stdout(predicate::str::contains("fresh"))
            .stdout(predicate::str::contains("folders    4"));

        let document = fs::read_to_string(fx.path().join("state").join("cache.json")).unwrap();
        assert!(document.contains("\"nrFolders\""));
    }

    #[test]
    fn cache_clear_empties_document() {
        let fx = Fixture::new(&["a/1.jpg"]);
        fx.cmd().arg("warm").assert().success();

        fx.cmd()
            .args(["cache", "clear", "--yes"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Cleared 2 cached folders"));

        fx.cmd()
            .args(["cache", "clear", "--yes"])
            .assert()
            .success()
            .stdout(predicate::str::contains("already empty"));
    }

    #[test]
    fn config_path() {
        let fx = Fixture::new(&[]);
        fx.cmd()
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        let fx = Fixture::new(&[]);
        fx.cmd()
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[selection]"))
            .stdout(predicate::str::contains("provider = \"local\""));
    }

    #[test]
    fn config_set_unknown_key_fails() {
        let fx = Fixture::new(&[]);
        fx.cmd()
            .args(["config", "set", "selection.nope", "x"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unknown config key"));
    }

    #[test]
    fn google_without_token_hints() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("config.toml");
        fs::write(&config, "[source]\nroot_folder_id = \"1AbC\"\n").unwrap();

        drivepick()
            .env("DRIVEPICK_CONFIG", &config)
            .env("XDG_STATE_HOME", dir.path())
            .env_remove("DRIVEPICK_TOKEN")
            .arg("weights")
            .assert()
            .failure()
            .stderr(predicate::str::contains("DRIVEPICK_TOKEN"))
            .stderr(predicate::str::contains("Hint:"));
    }

    #[test]
    fn invalid_config_rejected() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("config.toml");
        fs::write(&config, "[cache]\nttl_hours = 5000\n").unwrap();

        drivepick()
            .env("DRIVEPICK_CONFIG", &config)
            .args(["config", "show"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("stale_days"));
    }
}
