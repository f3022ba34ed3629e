use crate::core::roles::{
    has_any_role, is_admin, is_admin_or_librarian, is_librarian, is_member, normalize_role,
};
use crate::tests::test_user;

#[test]
fn normalize_handles_absent_and_blank_input() {
    assert_eq!(normalize_role(None), None);
    assert_eq!(normalize_role(Some("")), None);
    assert_eq!(normalize_role(Some("   ")), None);
}

#[test]
fn normalize_lowercases_and_trims() {
    assert_eq!(normalize_role(Some("Admin")).as_deref(), Some("admin"));
    assert_eq!(normalize_role(Some("  LIBRARIAN ")).as_deref(), Some("librarian"));
}

#[test]
fn predicates_are_false_without_a_user() {
    assert!(!is_admin(None));
    assert!(!is_librarian(None));
    assert!(!is_member(None));
    assert!(!is_admin_or_librarian(None));
    assert!(!has_any_role(None, &["admin", "member"]));
}

#[test]
fn role_checks_are_case_insensitive() {
    for spelling in ["ADMIN", "Admin", "admin", " admin "] {
        let user = test_user("u1", spelling);
        assert!(is_admin(Some(&user)), "spelling {spelling:?}");
        assert!(is_admin_or_librarian(Some(&user)));
    }
    let librarian = test_user("u2", "Librarian");
    assert!(is_librarian(Some(&librarian)));
    assert!(is_admin_or_librarian(Some(&librarian)));
}

#[test]
fn member_is_not_staff() {
    let member = test_user("u3", "member");
    assert!(is_member(Some(&member)));
    assert!(!is_admin_or_librarian(Some(&member)));
}

#[test]
fn has_any_role_normalizes_both_sides() {
    let user = test_user("u4", "  Member");
    assert!(has_any_role(Some(&user), &["ADMIN", "Member"]));
    assert!(!has_any_role(Some(&user), &["admin", "librarian"]));
    assert!(!has_any_role(Some(&user), &[]));
}
