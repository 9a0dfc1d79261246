use md_shell::PAGE_LOADED_COMMAND;

const BUILD_SCRIPT: &str = include_str!("../../build.rs");
const BACKEND_PAGE_CAPABILITY: &str = include_str!("../../capabilities/backend-page.json");

#[test]
fn given_confirmation_command_when_registered_then_name_matches_script() {
    // Given: the handler registered with generate_handler!
    let _handler = crate::commands::backend_page_loaded;
    let handler_name = stringify!(backend_page_loaded);

    // Then
    assert_eq!(handler_name, PAGE_LOADED_COMMAND);
    assert!(BUILD_SCRIPT.contains(&format!("\"{PAGE_LOADED_COMMAND}\"")));
}

#[test]
fn given_backend_page_capability_when_read_then_localhost_may_confirm() {
    // Given
    let permission = format!("allow-{}", PAGE_LOADED_COMMAND.replace('_', "-"));

    // Then
    assert!(BACKEND_PAGE_CAPABILITY.contains(&permission));
    assert!(BACKEND_PAGE_CAPABILITY.contains("http://127.0.0.1:*/*"));
    assert!(BACKEND_PAGE_CAPABILITY.contains(r#""windows": ["main"]"#));
}
