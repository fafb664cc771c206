//! Practice-management schema shipped with the tool.
//!
//! Ids are drawn from per-table sequences by the application
//! (`nextval('owners_id_seq')`). `owners` and `admin_users` receive additive
//! columns later on, so they take part in no declared foreign key: DuckDB
//! refuses `ALTER TABLE` on tables tied to one.

use vp_core::{MigrationUnit, UnitId};

/// Default admin roles `(name, description)`, in seed order.
pub const DEFAULT_ROLES: &[(&str, &str)] = &[
    ("super_admin", "Full access including user management"),
    ("admin", "Practice administration"),
    ("therapist", "Patient records and appointments"),
    ("reception", "Owners, appointments and invoices"),
];

/// All built-in units, in order.
pub fn builtin_units() -> Vec<MigrationUnit> {
    vec![
        create_owners(),
        create_patients(),
        create_appointments(),
        create_invoices(),
        create_admin(),
        seed_admin_roles(),
        add_owner_phone(),
        add_admin_is_super_admin(),
    ]
}

fn unit(id: &'static str) -> MigrationUnit {
    MigrationUnit::new(UnitId::from_static(id))
}

fn create_owners() -> MigrationUnit {
    unit("20240101000000_create_owners")
        .sql("CREATE SEQUENCE IF NOT EXISTS owners_id_seq")
        .table(
            "owners",
            &[
                "id BIGINT PRIMARY KEY",
                "firstname VARCHAR NOT NULL",
                "lastname VARCHAR NOT NULL",
                "email VARCHAR",
                "address VARCHAR",
                "created_at TIMESTAMP NOT NULL DEFAULT current_timestamp",
            ],
        )
}

fn create_patients() -> MigrationUnit {
    unit("20240101000100_create_patients")
        .sql("CREATE SEQUENCE IF NOT EXISTS patients_id_seq")
        .table(
            "patients",
            &[
                "id BIGINT PRIMARY KEY",
                "owner_id BIGINT NOT NULL",
                "name VARCHAR NOT NULL",
                "species VARCHAR NOT NULL",
                "breed VARCHAR",
                "date_of_birth DATE",
                "notes VARCHAR",
                "created_at TIMESTAMP NOT NULL DEFAULT current_timestamp",
            ],
        )
}

fn create_appointments() -> MigrationUnit {
    unit("20240101000200_create_appointments")
        .sql("CREATE SEQUENCE IF NOT EXISTS appointments_id_seq")
        .table(
            "appointments",
            &[
                "id BIGINT PRIMARY KEY",
                "patient_id BIGINT NOT NULL REFERENCES patients(id)",
                "starts_at TIMESTAMP NOT NULL",
                "duration_minutes INTEGER NOT NULL DEFAULT 45",
                "treatment VARCHAR",
                "status VARCHAR NOT NULL DEFAULT 'booked'",
                "notes VARCHAR",
            ],
        )
        .index(
            "idx_appointments_patient_start",
            "appointments",
            &["patient_id", "starts_at"],
            false,
        )
}

fn create_invoices() -> MigrationUnit {
    unit("20240101000300_create_invoices")
        .sql("CREATE SEQUENCE IF NOT EXISTS invoices_id_seq")
        .sql("CREATE SEQUENCE IF NOT EXISTS invoice_items_id_seq")
        .table(
            "invoices",
            &[
                "id BIGINT PRIMARY KEY",
                "owner_id BIGINT NOT NULL",
                "appointment_id BIGINT REFERENCES appointments(id)",
                "issued_on DATE NOT NULL",
                "due_on DATE",
                "status VARCHAR NOT NULL DEFAULT 'open'",
                "total_cents BIGINT NOT NULL DEFAULT 0",
            ],
        )
        .table(
            "invoice_items",
            &[
                "id BIGINT PRIMARY KEY",
                "invoice_id BIGINT NOT NULL REFERENCES invoices(id)",
                "description VARCHAR NOT NULL",
                "quantity INTEGER NOT NULL DEFAULT 1",
                "unit_price_cents BIGINT NOT NULL",
            ],
        )
}

fn create_admin() -> MigrationUnit {
    unit("20240101000400_create_admin")
        .sql("CREATE SEQUENCE IF NOT EXISTS admin_roles_id_seq")
        .sql("CREATE SEQUENCE IF NOT EXISTS admin_users_id_seq")
        .table(
            "admin_roles",
            &[
                "id BIGINT PRIMARY KEY",
                "name VARCHAR NOT NULL UNIQUE",
                "description VARCHAR",
            ],
        )
        .table(
            "admin_users",
            &[
                "id BIGINT PRIMARY KEY",
                "role_id BIGINT NOT NULL",
                "email VARCHAR NOT NULL UNIQUE",
                "password_hash VARCHAR NOT NULL",
                "display_name VARCHAR",
                "created_at TIMESTAMP NOT NULL DEFAULT current_timestamp",
            ],
        )
}

fn seed_admin_roles() -> MigrationUnit {
    let names: Vec<String> = DEFAULT_ROLES
        .iter()
        .map(|(name, _)| format!("'{name}'"))
        .collect();
    let rows: Vec<String> = DEFAULT_ROLES
        .iter()
        .map(|(name, description)| {
            format!("(nextval('admin_roles_id_seq'), '{name}', '{description}')")
        })
        .collect();
    let check = format!("name IN ({})", names.join(", "));
    let insert = format!(
        "INSERT INTO admin_roles (id, name, description) VALUES {}",
        rows.join(", ")
    );
    unit("20240101000500_seed_admin_roles").seed("admin_roles", &check, &[insert.as_str()])
}

fn add_owner_phone() -> MigrationUnit {
    unit("20240215000000_add_owner_phone").column("owners", "phone", "VARCHAR")
}

fn add_admin_is_super_admin() -> MigrationUnit {
    unit("20240301000000_add_admin_is_super_admin").column(
        "admin_users",
        "is_super_admin",
        "BOOLEAN DEFAULT false",
    )
}

#[cfg(test)]
#[path = "schema_test.rs"]
mod tests;
