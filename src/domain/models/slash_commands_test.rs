use super::SlashCommand;

#[test]
fn it_parse_empty_string() {
    let text = "";
    assert!(SlashCommand::parse(text).is_none());
}

#[test]
fn it_parse_space_only() {
    let text = " ";
    assert!(SlashCommand::parse(text).is_none());
}

#[test]
fn it_parse_single_slash() {
    let text = "/";
    assert!(SlashCommand::parse(text).is_none());
}

#[test]
fn it_parse_invalid_prefix() {
    let text = "!q";
    assert!(SlashCommand::parse(text).is_none());
}

#[test]
fn it_parse_regular_message() {
    let text = "What is /quit used for?";
    assert!(SlashCommand::parse(text).is_none());
}

#[test]
fn it_parse_valid_prefix() {
    let text = "/q";
    let cmd = SlashCommand::parse(text);
    assert!(cmd.is_some());
    assert_eq!(cmd.unwrap().command, "/q");
}

#[test]
fn it_is_quit() {
    for text in ["/q", "/quit", "/exit"] {
        assert!(SlashCommand::parse(text).unwrap().is_quit());
    }
}

#[test]
fn it_is_model_list() {
    for text in ["/ml", "/modellist", "/modelist"] {
        assert!(SlashCommand::parse(text).unwrap().is_model_list());
    }
}

#[test]
fn it_is_model_set_with_args() {
    let cmd = SlashCommand::parse("/model  gemini-1.5-pro ").unwrap();
    assert!(cmd.is_model_set());
    assert_eq!(cmd.args, vec!["gemini-1.5-pro".to_string()]);
}

#[test]
fn it_is_clear() {
    assert!(SlashCommand::parse("/clear").unwrap().is_clear());
    assert!(SlashCommand::parse("/cl").unwrap().is_clear());
}

#[test]
fn it_is_reset() {
    let cmd = SlashCommand::parse("/reset").unwrap();
    assert!(cmd.is_reset());
    assert!(!cmd.is_clear());
}

#[test]
fn it_is_help() {
    assert!(SlashCommand::parse("/h").unwrap().is_help());
    assert!(SlashCommand::parse("/help").unwrap().is_help());
}
