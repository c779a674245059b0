//! modprobe command synthesis.
//!
//! Turns a [`ModprobeSpec`] into the `/bin/sh -c` invocation run by the
//! module-loader container's lifecycle hooks. The command strings are matched
//! verbatim by operators and tests, so the order of every fragment is fixed.

use crate::constants::NODE_VAR_LIB_FIRMWARE_PATH;
use crds::ModprobeSpec;

const SHELL: &str = "/bin/sh";
const SHELL_COMMAND_FLAG: &str = "-c";
const MODPROBE: &str = "modprobe";
const DEFAULT_LOAD_FLAGS: &str = "-v";
const DEFAULT_UNLOAD_FLAGS: &str = "-rv";

/// Builds the command executed by the postStart hook.
///
/// `module_name` is the Module object's name; it names the firmware directory
/// on the node. The kernel module itself is `spec.module_name`.
pub fn make_load_command(spec: &ModprobeSpec, module_name: &str) -> Vec<String> {
    if let Some(raw) = non_empty(spec.raw_args.as_ref().map(|a| &a.load)) {
        return shell(format!("{MODPROBE} {}", raw.join(" ")));
    }

    let mut command = match firmware_path(spec) {
        Some(fw) => format!(
            "cp -r {fw} {} && {MODPROBE}",
            module_firmware_dir(module_name)
        ),
        None => MODPROBE.to_string(),
    };

    push_flags(&mut command, spec.args.as_ref().map(|a| &a.load), DEFAULT_LOAD_FLAGS);
    push_dir_and_module(&mut command, spec);

    if !spec.parameters.is_empty() {
        command.push(' ');
        command.push_str(&spec.parameters.join(" "));
    }

    shell(command)
}

/// Builds the command executed by the preStop hook.
pub fn make_unload_command(spec: &ModprobeSpec, module_name: &str) -> Vec<String> {
    if let Some(raw) = non_empty(spec.raw_args.as_ref().map(|a| &a.unload)) {
        return shell(format!("{MODPROBE} {}", raw.join(" ")));
    }

    let mut command = MODPROBE.to_string();

    push_flags(&mut command, spec.args.as_ref().map(|a| &a.unload), DEFAULT_UNLOAD_FLAGS);
    push_dir_and_module(&mut command, spec);

    if firmware_path(spec).is_some() {
        command.push_str(" && rm -rf ");
        command.push_str(&module_firmware_dir(module_name));
    }

    shell(command)
}

/// Directory on the node the module's firmware is staged into.
pub(crate) fn module_firmware_dir(module_name: &str) -> String {
    format!("{NODE_VAR_LIB_FIRMWARE_PATH}/{module_name}")
}

pub(crate) fn firmware_path(spec: &ModprobeSpec) -> Option<&str> {
    spec.firmware_path.as_deref().filter(|fw| !fw.is_empty())
}

fn push_flags(command: &mut String, args: Option<&Vec<String>>, default: &str) {
    command.push(' ');
    match non_empty(args) {
        Some(args) => command.push_str(&args.join(" ")),
        None => command.push_str(default),
    }
}

fn push_dir_and_module(command: &mut String, spec: &ModprobeSpec) {
    if let Some(dir) = spec.dir_name.as_deref().filter(|d| !d.is_empty()) {
        command.push_str(" -d ");
        command.push_str(dir);
    }

    command.push(' ');
    command.push_str(&spec.module_name);
}

fn non_empty(args: Option<&Vec<String>>) -> Option<&Vec<String>> {
    args.filter(|a| !a.is_empty())
}

fn shell(command: String) -> Vec<String> {
    vec![SHELL.to_string(), SHELL_COMMAND_FLAG.to_string(), command]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crds::ModprobeArgs;

    fn spec(module_name: &str) -> ModprobeSpec {
        ModprobeSpec {
            module_name: module_name.to_string(),
            ..Default::default()
        }
    }

    fn args(load: &[&str], unload: &[&str]) -> Option<ModprobeArgs> {
        Some(ModprobeArgs {
            load: load.iter().map(ToString::to_string).collect(),
            unload: unload.iter().map(ToString::to_string).collect(),
        })
    }

    #[test]
    fn test_default_commands() {
        let spec = spec("kmm_ci_a");

        assert_eq!(
            make_load_command(&spec, "kmm-ci"),
            vec!["/bin/sh", "-c", "modprobe -v kmm_ci_a"]
        );
        assert_eq!(
            make_unload_command(&spec, "kmm-ci"),
            vec!["/bin/sh", "-c", "modprobe -rv kmm_ci_a"]
        );
    }

    #[test]
    fn test_firmware_and_parameters() {
        let spec = ModprobeSpec {
            firmware_path: Some("/firmware".to_string()),
            parameters: vec!["p1=1".to_string(), "p2=2".to_string()],
            ..spec("m")
        };

        assert_eq!(
            make_load_command(&spec, "m")[2],
            "cp -r /firmware /var/lib/firmware/m && modprobe -v m p1=1 p2=2"
        );
        assert_eq!(
            make_unload_command(&spec, "m")[2],
            "modprobe -rv m && rm -rf /var/lib/firmware/m"
        );
    }

    #[test]
    fn test_firmware_dir_uses_module_object_name() {
        let spec = ModprobeSpec {
            firmware_path: Some("/opt/fw".to_string()),
            ..spec("kmm_ci_a")
        };

        assert_eq!(
            make_load_command(&spec, "kmm-ci")[2],
            "cp -r /opt/fw /var/lib/firmware/kmm-ci && modprobe -v kmm_ci_a"
        );
        assert_eq!(
            make_unload_command(&spec, "kmm-ci")[2],
            "modprobe -rv kmm_ci_a && rm -rf /var/lib/firmware/kmm-ci"
        );
    }

    #[test]
    fn test_dir_name() {
        let spec = ModprobeSpec {
            dir_name: Some("/opt".to_string()),
            parameters: vec!["debug=1".to_string()],
            ..spec("m")
        };

        assert_eq!(make_load_command(&spec, "m")[2], "modprobe -v -d /opt m debug=1");
        assert_eq!(make_unload_command(&spec, "m")[2], "modprobe -rv -d /opt m");
    }

    #[test]
    fn test_args_replace_default_flags() {
        let spec = ModprobeSpec {
            args: args(&["-v", "--first-time"], &["-r", "--quiet"]),
            dir_name: Some("/opt".to_string()),
            ..spec("m")
        };

        assert_eq!(
            make_load_command(&spec, "m")[2],
            "modprobe -v --first-time -d /opt m"
        );
        assert_eq!(make_unload_command(&spec, "m")[2], "modprobe -r --quiet -d /opt m");
    }

    #[test]
    fn test_empty_args_fall_back_to_defaults() {
        let spec = ModprobeSpec {
            args: args(&[], &[]),
            ..spec("m")
        };

        assert_eq!(make_load_command(&spec, "m")[2], "modprobe -v m");
        assert_eq!(make_unload_command(&spec, "m")[2], "modprobe -rv m");
    }

    #[test]
    fn test_raw_args_ignore_everything_else() {
        let full = ModprobeSpec {
            dir_name: Some("/opt".to_string()),
            firmware_path: Some("/firmware".to_string()),
            parameters: vec!["p=1".to_string()],
            args: args(&["-f"], &["-f"]),
            raw_args: args(&["-v", "raw_load"], &["-r", "raw_unload"]),
            ..spec("m")
        };
        let bare = ModprobeSpec {
            raw_args: full.raw_args.clone(),
            ..spec("other")
        };

        assert_eq!(make_load_command(&full, "m")[2], "modprobe -v raw_load");
        assert_eq!(make_load_command(&full, "m"), make_load_command(&bare, "x"));
        assert_eq!(make_unload_command(&full, "m")[2], "modprobe -r raw_unload");
        assert_eq!(make_unload_command(&full, "m"), make_unload_command(&bare, "x"));
    }

    #[test]
    fn test_raw_args_apply_per_direction() {
        let spec = ModprobeSpec {
            raw_args: args(&["raw_load"], &[]),
            firmware_path: Some("/firmware".to_string()),
            ..spec("m")
        };

        assert_eq!(make_load_command(&spec, "m")[2], "modprobe raw_load");
        assert_eq!(
            make_unload_command(&spec, "m")[2],
            "modprobe -rv m && rm -rf /var/lib/firmware/m"
        );
    }

    #[test]
    fn test_empty_optional_strings_are_unset() {
        let spec = ModprobeSpec {
            dir_name: Some(String::new()),
            firmware_path: Some(String::new()),
            ..spec("m")
        };

        assert_eq!(make_load_command(&spec, "m")[2], "modprobe -v m");
        assert_eq!(make_unload_command(&spec, "m")[2], "modprobe -rv m");
    }

    #[test]
    fn test_module_name_once_with_ordered_parameters_after_it() {
        let spec = ModprobeSpec {
            dir_name: Some("/lib/modules/extra".to_string()),
            parameters: vec!["z=1".to_string(), "a=2".to_string(), "m=3".to_string()],
            ..spec("mymod")
        };

        let command = &make_load_command(&spec, "mymod")[2];
        assert_eq!(command.matches(" mymod").count(), 1);

        let module_at = command.find(" mymod").unwrap();
        let z = command.find("z=1").unwrap();
        let a = command.find("a=2").unwrap();
        let m = command.find("m=3").unwrap();
        assert!(module_at < z && z < a && a < m);
    }
}
