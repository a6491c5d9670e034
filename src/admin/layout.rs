use serde::Serialize;

/// Named group of fields on the user edit form.
#[derive(Debug, Serialize)]
pub struct FieldGroup {
    pub title: Option<&'static str>,
    pub fields: &'static [&'static str],
}

/// Declarative description of the user admin screens.
#[derive(Debug, Serialize)]
pub struct AdminLayout {
    pub list_display: &'static [&'static str],
    pub list_filter: &'static [&'static str],
    pub search_fields: &'static [&'static str],
    pub ordering: &'static [&'static str],
    pub fieldsets: &'static [FieldGroup],
}

pub const USER_ADMIN: AdminLayout = AdminLayout {
    list_display: &[
        "email",
        "username",
        "first_name",
        "last_name",
        "family_role",
        "job",
        "is_staff",
    ],
    list_filter: &["family_role", "is_staff", "is_superuser", "is_active"],
    search_fields: &["email", "username", "first_name", "last_name"],
    ordering: &["email"],
    fieldsets: &[
        FieldGroup {
            title: None,
            fields: &["username", "password"],
        },
        FieldGroup {
            title: Some("Personal Info"),
            fields: &["first_name", "last_name", "email", "cellphone", "job"],
        },
        FieldGroup {
            title: Some("Family Info"),
            fields: &["family_role"],
        },
        FieldGroup {
            title: Some("Permissions"),
            fields: &["is_active", "is_staff", "is_superuser"],
        },
        FieldGroup {
            title: Some("Important dates"),
            fields: &["last_login", "date_joined"],
        },
    ],
};
