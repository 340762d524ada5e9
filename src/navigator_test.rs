use super::*;

#[test]
fn view_paths_follow_config() {
    let mut config = ClientConfig::default();
    config.login_path = "/signin".into();
    assert_eq!(View::Login.path(&config), "/signin");
    assert_eq!(View::Register.path(&config), "/register");
    assert_eq!(View::Books.path(&config), "/books");
}

#[test]
fn recording_navigator_keeps_order() {
    let nav = RecordingNavigator::new();
    assert!(nav.last().is_none());
    nav.redirect_to("/login");
    nav.redirect_to("/books");
    assert_eq!(nav.history(), vec!["/login".to_owned(), "/books".to_owned()]);
    assert_eq!(nav.last().as_deref(), Some("/books"));
}
