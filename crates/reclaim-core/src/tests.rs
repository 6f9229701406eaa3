use super::*;

#[test]
fn parse_package_description() {
    let content = r#"
token = "fancy"
version = "1.2.3"

[[uninstall]]
early_script = { executable = "MyFancyPkg/FancyUninstaller.tool", args = ["--please"] }
launchctl = "my.fancy.package.service"
quit = ["my.fancy.package.app"]
signal = [{ bundle_id = "my.fancy.package.app", signals = ["TERM", "SIGKILL"] }]
login_item = "Fancy"
kext = "my.fancy.package.kernelextension"
pkgutil = "my.fancy.package.*"
rmdir = "~/Library/FancyDir"
delete = ["/permissible/absolute/path", "~/permissible/path/with/tilde"]
trash = "~/Library/Preferences/fancy.plist"
"#;

    let parsed = UninstallSpec::from_toml_str(content).expect("description should parse");
    assert_eq!(parsed.token, "fancy");
    assert_eq!(parsed.version.as_deref(), Some("1.2.3"));
    assert_eq!(parsed.directives().len(), 10);

    let Directive::EarlyScript(script) = &parsed.directives()[0] else {
        panic!("first directive should be the early script");
    };
    assert_eq!(script.executable, "MyFancyPkg/FancyUninstaller.tool");
    assert_eq!(script.args, vec!["--please"]);
    assert!(script.must_succeed);

    assert!(parsed.directives().contains(&Directive::Signal(SignalDirective {
        bundle_id: "my.fancy.package.app".to_string(),
        signals: vec![Signal::Term, Signal::Kill],
    })));
    assert!(parsed.directives().contains(&Directive::Delete(vec![
        "/permissible/absolute/path".to_string(),
        "~/permissible/path/with/tilde".to_string(),
    ])));
}

#[test]
fn execution_order_is_technique_determined() {
    let content = r#"
token = "fancy"

[[uninstall]]
trash = "~/Library/Caches/fancy"
delete = "/Library/Fancy"
pkgutil = "my.fancy.package.*"
launchctl = ["second.service"]
script = { executable = "uninstall.sh" }

[[uninstall]]
launchctl = "third.service"
early_script = { executable = "prepare.sh" }
rmdir = "/Library/FancyDir"
"#;

    let parsed = UninstallSpec::from_toml_str(content).expect("description should parse");
    let techniques = parsed
        .execution_order()
        .into_iter()
        .map(Directive::technique)
        .collect::<Vec<_>>();
    assert_eq!(
        techniques,
        vec![
            Technique::EarlyScript,
            Technique::Launchctl,
            Technique::Launchctl,
            Technique::Pkgutil,
            Technique::Script,
            Technique::Rmdir,
            Technique::Delete,
            Technique::Trash,
        ]
    );

    let labels = parsed
        .execution_order()
        .into_iter()
        .filter_map(|directive| match directive {
            Directive::Launchctl(label) => Some(label.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>();
    assert_eq!(labels, vec!["second.service", "third.service"]);
}

#[test]
fn groups_skip_absent_techniques() {
    let spec = UninstallSpec::new(
        "demo",
        vec![
            Directive::Delete(vec!["/tmp/demo".to_string()]),
            Directive::Quit("com.example.demo".to_string()),
            Directive::Quit("com.example.helper".to_string()),
        ],
    );

    let groups = spec.groups();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].0, Technique::Quit);
    assert_eq!(groups[0].1.len(), 2);
    assert_eq!(groups[1].0, Technique::Delete);
}

#[test]
fn phase_order_matches_uninstall_sequence() {
    let names = Technique::PHASE_ORDER
        .iter()
        .map(|technique| technique.as_str())
        .collect::<Vec<_>>();
    assert_eq!(
        names,
        vec![
            "early_script",
            "launchctl",
            "quit",
            "signal",
            "login_item",
            "kext",
            "pkgutil",
            "script",
            "rmdir",
            "delete",
            "trash",
        ]
    );
}

#[test]
fn signal_names_normalize() {
    assert_eq!(Signal::parse("TERM").expect("TERM"), Signal::Term);
    assert_eq!(Signal::parse("SIGKILL").expect("SIGKILL"), Signal::Kill);
    assert_eq!(Signal::parse(" hup ").expect("hup"), Signal::Hup);
    let err = Signal::parse("SIGWINCH").expect_err("unsupported signal must fail");
    assert!(
        err.to_string().contains("unsupported signal 'SIGWINCH'"),
        "unexpected error: {err}"
    );
}

#[test]
fn reject_unknown_signal_in_description() {
    let content = r#"
token = "fancy"

[[uninstall]]
signal = { bundle_id = "my.fancy.package.app", signals = ["BOGUS"] }
"#;
    let err = UninstallSpec::from_toml_str(content).expect_err("unknown signal must fail");
    assert!(
        err.to_string().contains("failed to parse package description"),
        "unexpected error: {err}"
    );
    assert!(
        format!("{err:#}").contains("unsupported signal 'BOGUS'"),
        "unexpected error: {err:#}"
    );
}

#[test]
fn script_accepts_bare_path_shorthand() {
    let content = r#"
token = "fancy"

[[uninstall]]
script = ["MyFancyPkg/Uninstall.tool", { executable = "MyFancyPkg/Cleanup.tool", must_succeed = false }]
"#;
    let parsed = UninstallSpec::from_toml_str(content).expect("description should parse");
    assert_eq!(
        parsed.directives(),
        &[
            Directive::Script(ScriptDirective {
                executable: "MyFancyPkg/Uninstall.tool".to_string(),
                args: Vec::new(),
                must_succeed: true,
            }),
            Directive::Script(ScriptDirective {
                executable: "MyFancyPkg/Cleanup.tool".to_string(),
                args: Vec::new(),
                must_succeed: false,
            }),
        ]
    );
}

#[test]
fn script_table_rejects_unknown_keys() {
    let content = r#"
token = "fancy"

[[uninstall]]
early_script = { executable = "MyFancyPkg/Uninstall.tool", sudo = true }
"#;
    let err = UninstallSpec::from_toml_str(content).expect_err("unknown key must fail");
    assert!(format!("{err:#}").contains("sudo"), "unexpected error: {err:#}");
}

#[test]
fn reject_empty_signal_list() {
    let content = r#"
token = "fancy"

[[uninstall]]
signal = { bundle_id = "my.fancy.package.app", signals = [] }
"#;
    let err = UninstallSpec::from_toml_str(content).expect_err("empty signal list must fail");
    let message = format!("{err:#}");
    assert!(
        message.contains("must list at least one signal"),
        "unexpected error: {message}"
    );
    assert!(
        message.contains("invalid uninstall stanza #1"),
        "unexpected error: {message}"
    );
}

#[test]
fn reject_empty_entries() {
    let content = r#"
token = "fancy"

[[uninstall]]
launchctl = ["ok.service", "  "]
"#;
    let err = UninstallSpec::from_toml_str(content).expect_err("blank label must fail");
    assert!(
        format!("{err:#}").contains("launchctl entry must not be empty"),
        "unexpected error: {err:#}"
    );
}

#[test]
fn reject_unknown_technique() {
    let content = r#"
token = "fancy"

[[uninstall]]
launchd = "my.fancy.package.service"
"#;
    assert!(UninstallSpec::from_toml_str(content).is_err());
}

#[test]
fn reject_empty_token() {
    let err = UninstallSpec::from_toml_str("token = \"\"\n").expect_err("empty token must fail");
    assert!(
        err.to_string().contains("package token must not be empty"),
        "unexpected error: {err}"
    );
}

#[test]
fn description_without_uninstall_stanzas_is_empty() {
    let parsed = UninstallSpec::from_toml_str("token = \"bare\"\n").expect("must parse");
    assert!(parsed.directives().is_empty());
    assert!(parsed.groups().is_empty());
}

#[test]
fn script_must_succeed_can_be_disabled() {
    let content = r#"
token = "fancy"

[[uninstall]]
script = [
  { executable = "a.sh", must_succeed = false },
  { executable = "/opt/fancy/b.sh", args = ["-y"] },
]
"#;
    let parsed = UninstallSpec::from_toml_str(content).expect("must parse");
    let scripts = parsed
        .directives()
        .iter()
        .filter_map(|directive| match directive {
            Directive::Script(script) => Some(script),
            _ => None,
        })
        .collect::<Vec<_>>();
    assert_eq!(scripts.len(), 2);
    assert!(!scripts[0].must_succeed);
    assert!(scripts[1].must_succeed);
    assert_eq!(parsed.directives()[1].target(), "/opt/fancy/b.sh -y");
}

#[test]
fn directive_target_describes_signals() {
    let directive = Directive::Signal(SignalDirective {
        bundle_id: "my.fancy.package.app".to_string(),
        signals: vec![Signal::Term, Signal::Kill],
    });
    assert_eq!(directive.target(), "my.fancy.package.app [TERM, KILL]");
    assert_eq!(directive.technique(), Technique::Signal);
}
