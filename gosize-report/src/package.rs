/// Returns the package part of a function name, or the empty string if
/// there is none.
///
/// `go.` and `type.` prefixes mark compiler-generated symbols that belong
/// to no package. For everything else the package is the name up to the
/// first dot after the last slash, so receivers and method names never
/// split an import path like `compress/gzip`.
pub fn package_name(name: &str) -> &str {
    if name.starts_with("go.") || name.starts_with("type.") {
        return "";
    }
    let path_end = name.rfind('/').unwrap_or(0);
    match name[path_end..].find('.') {
        Some(dot) => &name[..path_end + dot],
        None => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_name() {
        let cases = [
            ("context.(*emptyCtx).Err", "context"),
            ("compress/gzip.(*Reader).Read", "compress/gzip"),
            ("main.main", "main"),
            ("go.buildid", ""),
            ("type..hash.main.T", ""),
            ("runtime.morestack", "runtime"),
            (
                "github.com/tailscale/wireguard-go/device.(*Device).RoutineHandshake",
                "github.com/tailscale/wireguard-go/device",
            ),
            ("crosscall2", ""),
            ("", ""),
        ];
        for (name, package) in cases {
            assert_eq!(package_name(name), package, "package of {name:?}");
        }
    }

    #[test]
    fn test_package_name_deterministic() {
        let name = "compress/gzip.(*Reader).Read";
        assert_eq!(package_name(name), package_name(name));
    }
}
