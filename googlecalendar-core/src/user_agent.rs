//! User-agent string sent with every Calendar API request.

/// Platform names as Terraform reports them.
fn platform_os(os: &str) -> &str {
    match os {
        "macos" => "darwin",
        other => other,
    }
}

fn platform_arch(arch: &str) -> &str {
    match arch {
        "x86_64" => "amd64",
        "x86" => "386",
        "aarch64" => "arm64",
        other => other,
    }
}

fn format_user_agent(os: &str, arch: &str, terraform_version: &str) -> String {
    format!(
        "({} {}) Terraform/{}",
        platform_os(os),
        platform_arch(arch),
        terraform_version
    )
}

/// `(<os> <arch>) Terraform/<version>` for the running platform.
pub fn user_agent(terraform_version: &str) -> String {
    format_user_agent(
        std::env::consts::OS,
        std::env::consts::ARCH,
        terraform_version,
    )
}
