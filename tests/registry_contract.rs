use std::{collections::HashMap, collections::HashSet, thread};

use ksu_devkit::{Group, Registry, RegistryError, TemplateError, Value, registry};

fn no_subs() -> HashMap<String, String> {
    HashMap::new()
}

#[test]
fn exposed_literals_are_bit_exact() {
    let reg = registry();
    let cases = [
        ("KSU_ENV_VAR", "KSU"),
        ("KSU_VERSION_VAR", "KSU_VER"),
        ("MAGISK_VER_CODE_VAR", "MAGISK_VER_CODE"),
        ("MODULES_ROOT", "/data/adb/modules"),
        ("KSU_BIN_PATH", "/data/adb/ksu/bin"),
        ("BUSYBOX_PATH", "/data/adb/ksu/bin/busybox"),
        ("MODULE_PROP", "module.prop"),
        ("POST_FS_DATA_SCRIPT", "post-fs-data.sh"),
        ("SERVICE_SCRIPT", "service.sh"),
        ("CUSTOMIZE_SCRIPT", "customize.sh"),
        ("SEPOLICY_RULE", "sepolicy.rule"),
        ("PROP_ID", "id"),
        ("PROP_NAME", "name"),
        ("PROP_VERSION", "version"),
        ("PROP_VERSION_CODE", "versionCode"),
        ("PROP_AUTHOR", "author"),
        ("PROP_DESCRIPTION", "description"),
        ("DEFAULT_DIR_PERM", "0755"),
        ("DEFAULT_FILE_PERM", "0644"),
        ("DEFAULT_CONTEXT", "u:object_r:system_file:s0"),
        ("MODDIR_VAR", "${0%/*}"),
        ("KSU_CHECK", "[ \"$KSU\" = \"true\" ]"),
        ("BUSYBOX_SETUP", "export PATH=\"/data/adb/ksu/bin:$PATH\""),
        ("AWK_FIELD", "awk '{print $1}'"),
        ("COLOR_NC", "\x1b[0m"),
    ];
    for (name, expected) in cases {
        assert_eq!(reg.lookup(name).unwrap().as_text(), expected, "{name}");
    }
}

#[test]
fn function_templates_keep_their_exact_text() {
    let reg = registry();
    assert_eq!(
        reg.resolve_template("LOG_FUNCTIONS", &no_subs()).unwrap(),
        "log_info() { echo -e \"\\033[0;34m[INFO]\\033[0m $1\"; }\n\
         log_success() { echo -e \"\\033[0;32m[SUCCESS]\\033[0m $1\"; }\n\
         log_warning() { echo -e \"\\033[1;33m[WARNING]\\033[0m $1\"; }\n\
         log_error() { echo -e \"\\033[0;31m[ERROR]\\033[0m $1\"; }\n"
    );
    assert_eq!(
        reg.resolve_template("CHECK_KERNELSU", &no_subs()).unwrap(),
        "check_kernelsu() {\n    if [ \"$KSU\" != \"true\" ]; then\n        \
         log_error \"This script requires KernelSU\"\n        exit 1\n    fi\n}\n"
    );
    assert_eq!(
        reg.resolve_template("CHECK_INTERNET", &no_subs()).unwrap(),
        "check_internet() {\n    ping -c 1 8.8.8.8 >/dev/null 2>&1\n}\n"
    );
    let pm = reg.resolve_template("DETECT_PM", &no_subs()).unwrap();
    assert!(pm.contains("        echo \"cmd package\"\n"));
}

#[test]
fn check_root_has_root_test_and_closed_body() {
    let out = registry().resolve_template("CHECK_ROOT", &no_subs()).unwrap();
    assert!(out.contains("if [ \"$(id -u)\" != \"0\" ]; then"));
    assert!(out.ends_with("}\n"));
    assert_eq!(out.matches('{').count(), out.matches('}').count());
}

#[test]
fn unknown_name_fails_with_not_found() {
    assert!(matches!(
        registry().lookup("does-not-exist"),
        Err(RegistryError::NotFound(name)) if name == "does-not-exist"
    ));
    assert!(matches!(
        registry().resolve_template("NO_SUCH_TEMPLATE", &no_subs()),
        Err(RegistryError::NotFound(_))
    ));
}

#[test]
fn permissions_are_non_empty_and_unique() {
    let perms = registry().enumerate(Group::Permissions);
    assert!(!perms.is_empty());
    let names: HashSet<&str> = perms.iter().map(|(n, _)| *n).collect();
    assert_eq!(names.len(), perms.len());
    assert!(perms.contains(&("PERM_EXECUTABLE", &Value::Mode(0o755))));
}

#[test]
fn every_enumerated_entry_looks_up_to_the_same_value() {
    let reg = registry();
    let mut seen = HashSet::new();
    for group in Group::ALL {
        for (name, value) in reg.enumerate(group) {
            assert!(seen.insert(name.to_string()), "{name} appears in two groups");
            assert_eq!(reg.lookup(name).unwrap(), value);
            assert_eq!(reg.group_of(name).unwrap(), group);
        }
    }
    assert_eq!(seen.len(), reg.len());
}

#[test]
fn repeated_calls_are_identical() {
    let reg = registry();
    assert_eq!(reg.lookup("WAIT_FOR_BOOT"), reg.lookup("WAIT_FOR_BOOT"));
    assert_eq!(
        reg.resolve_template("DETECT_PM", &no_subs()),
        reg.resolve_template("DETECT_PM", &no_subs())
    );
    assert!(std::ptr::eq(registry(), reg));
}

#[test]
fn enumeration_order_is_stable_across_instances() {
    let a = Registry::builtin().unwrap();
    let b = Registry::builtin().unwrap();
    for group in Group::ALL {
        assert_eq!(a.enumerate(group), b.enumerate(group));
    }
}

#[test]
fn enums_and_flags_are_closed_sets() {
    let reg = registry();
    let enums = reg.enumerate(Group::Enums);
    assert_eq!(enums.len(), 8);
    assert_eq!(reg.lookup("MODULE_TYPE_WEBUI").unwrap(), &Value::Ordinal(2));

    let mut union = 0u32;
    for (name, value) in reg.enumerate(Group::Flags) {
        let Value::Flag(bits) = value else {
            panic!("{name} is not a flag");
        };
        assert_eq!(bits.count_ones(), 1, "{name}");
        assert_eq!(union & bits, 0, "{name} shares a bit");
        union |= bits;
    }
    assert_eq!(union, 0x1f);
}

#[test]
fn x86_64_alias_documents_x64() {
    let reg = registry();
    assert_eq!(reg.lookup("ARCH_X86_64").unwrap().as_text(), "x64");
    assert!(!reg.enumerate(Group::Arch).iter().any(|(n, _)| *n == "ARCH_X86_64"));
}

#[test]
fn malformed_user_template_is_rejected() {
    let reg = Registry::with_bindings(
        vec![],
        vec![
            ("OPEN_BRACE", "broken() {\n    echo hi\n"),
            ("BAD_PLACEHOLDER", "echo {{unfinished\n"),
        ],
    )
    .unwrap();
    assert!(matches!(
        reg.resolve_template("OPEN_BRACE", &no_subs()),
        Err(RegistryError::Template { source: TemplateError::Unbalanced(_), .. })
    ));
    assert!(matches!(
        reg.resolve_template("BAD_PLACEHOLDER", &no_subs()),
        Err(RegistryError::Template { source: TemplateError::Malformed(_), .. })
    ));
}

#[test]
fn user_template_with_case_and_heredoc_resolves() {
    let service = concat!(
        "handle() {\n",
        "    case \"$1\" in\n",
        "        start) ui_print \"Step 1) {{step}}\" ;;\n",
        "        *) cat <<EOF\nit's unknown\nEOF\n",
        "        ;;\n",
        "    esac\n",
        "}\n",
    );
    let reg = Registry::with_bindings(vec![], vec![("CASE_HANDLER", service)]).unwrap();
    let subs = HashMap::from([("step".to_string(), "done".to_string())]);
    let out = reg.resolve_template("CASE_HANDLER", &subs).unwrap();
    assert!(out.contains("ui_print \"Step 1) done\""));
}

#[test]
fn shared_across_threads_without_locks() {
    let handles: Vec<_> = (0..8)
        .map(|_| {
            thread::spawn(|| {
                registry()
                    .resolve_template("WAIT_FOR_BOOT", &HashMap::new())
                    .unwrap()
            })
        })
        .collect();
    let outputs: HashSet<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(outputs.len(), 1);
}
