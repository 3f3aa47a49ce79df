//! SQLite schema definition.

/// Complete database schema for hospital records.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Staff & Sessions
-- ============================================================================

CREATE TABLE IF NOT EXISTS profiles (
    id TEXT PRIMARY KEY,
    full_name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    phone TEXT,
    address TEXT,
    role TEXT NOT NULL CHECK (role IN (
        'admin', 'doctor', 'nurse', 'lab_tech', 'pharmacist',
        'cashier', 'receptionist', 'security'
    )),
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
);

CREATE TABLE IF NOT EXISTS sessions (
    token_hash TEXT PRIMARY KEY,                 -- SHA-256 hex of the bearer token
    user_id TEXT NOT NULL REFERENCES profiles(id),
    created_at TEXT NOT NULL,
    revoked_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id);

-- ============================================================================
-- Patients
-- ============================================================================

CREATE TABLE IF NOT EXISTS patients (
    id TEXT PRIMARY KEY,
    patient_number TEXT NOT NULL UNIQUE,
    full_name TEXT NOT NULL,
    date_of_birth TEXT,
    age INTEGER CHECK (age IS NULL OR age >= 0),
    sex TEXT CHECK (sex IS NULL OR sex IN ('Male', 'Female', 'Other')),
    phone TEXT,
    email TEXT,
    address TEXT,
    city TEXT,
    blood_group TEXT,
    allergies TEXT NOT NULL DEFAULT '[]',        -- JSON array of strings
    insurance_company TEXT,
    insurance_number TEXT,
    insurance_status TEXT NOT NULL DEFAULT 'none'
        CHECK (insurance_status IN ('none', 'active', 'expired')),
    patient_type TEXT NOT NULL DEFAULT 'outpatient'
        CHECK (patient_type IN ('outpatient', 'inpatient')),
    registered_by TEXT REFERENCES profiles(id),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_patients_created_at ON patients(created_at);
CREATE INDEX IF NOT EXISTS idx_patients_name ON patients(full_name);

-- ============================================================================
-- Appointments & Consultations
-- ============================================================================

CREATE TABLE IF NOT EXISTS appointments (
    id TEXT PRIMARY KEY,
    patient_id TEXT NOT NULL REFERENCES patients(id),
    doctor_id TEXT REFERENCES profiles(id),
    appointment_date TEXT NOT NULL,
    reason TEXT,
    notes TEXT,
    status TEXT NOT NULL DEFAULT 'pending'
        CHECK (status IN ('pending', 'in_progress', 'completed', 'cancelled')),
    created_by TEXT REFERENCES profiles(id),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_appointments_patient ON appointments(patient_id);
CREATE INDEX IF NOT EXISTS idx_appointments_date ON appointments(appointment_date);

CREATE TABLE IF NOT EXISTS consultations (
    id TEXT PRIMARY KEY,
    patient_id TEXT NOT NULL REFERENCES patients(id),
    doctor_id TEXT NOT NULL REFERENCES profiles(id),
    appointment_id TEXT REFERENCES appointments(id),
    consultation_date TEXT NOT NULL,
    chief_complaint TEXT,
    signs_and_symptoms TEXT,
    initial_diagnosis TEXT,
    confirmatory_diagnosis TEXT,
    treatment_plan TEXT,
    follow_up_date TEXT,
    status TEXT NOT NULL DEFAULT 'pending'
        CHECK (status IN ('pending', 'in_progress', 'completed', 'cancelled')),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_consultations_patient ON consultations(patient_id);

CREATE TABLE IF NOT EXISTS lab_requests (
    id TEXT PRIMARY KEY,
    patient_id TEXT NOT NULL REFERENCES patients(id),
    consultation_id TEXT REFERENCES consultations(id),
    test_name TEXT NOT NULL,
    test_type TEXT NOT NULL,
    requested_by TEXT NOT NULL REFERENCES profiles(id),
    requested_at TEXT NOT NULL,
    performed_by TEXT REFERENCES profiles(id),
    results TEXT,
    notes TEXT,
    status TEXT NOT NULL DEFAULT 'requested'
        CHECK (status IN ('requested', 'paid', 'in_progress', 'completed', 'cancelled')),
    completed_at TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_lab_requests_patient ON lab_requests(patient_id);

-- ============================================================================
-- Billing
-- ============================================================================

CREATE TABLE IF NOT EXISTS bills (
    id TEXT PRIMARY KEY,
    bill_number TEXT NOT NULL UNIQUE,
    patient_id TEXT NOT NULL REFERENCES patients(id),
    consultation_id TEXT REFERENCES consultations(id),
    admission_id TEXT REFERENCES admissions(id),
    total_amount_cents INTEGER NOT NULL CHECK (total_amount_cents >= 0),
    discount_cents INTEGER NOT NULL DEFAULT 0 CHECK (discount_cents >= 0),
    paid_amount_cents INTEGER NOT NULL DEFAULT 0
        CHECK (paid_amount_cents >= 0 AND paid_amount_cents <= total_amount_cents),
    payment_method TEXT CHECK (payment_method IS NULL OR payment_method IN ('cash', 'credit', 'insurance', 'deposit')),
    payment_status TEXT NOT NULL DEFAULT 'pending'
        CHECK (payment_status IN ('pending', 'partial', 'paid', 'overdue')),
    created_by TEXT REFERENCES profiles(id),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_bills_patient ON bills(patient_id);

CREATE TABLE IF NOT EXISTS bill_items (
    id TEXT PRIMARY KEY,
    bill_id TEXT NOT NULL REFERENCES bills(id),
    item_name TEXT NOT NULL,
    item_type TEXT NOT NULL,
    quantity INTEGER NOT NULL CHECK (quantity > 0),
    unit_price_cents INTEGER NOT NULL CHECK (unit_price_cents >= 0),
    total_price_cents INTEGER NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_bill_items_bill ON bill_items(bill_id);

-- ============================================================================
-- Pharmacy
-- ============================================================================

CREATE TABLE IF NOT EXISTS pharmacy_inventory (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    generic_name TEXT,
    category TEXT,
    batch_number TEXT,
    expiry_date TEXT,
    quantity_in_stock INTEGER NOT NULL DEFAULT 0 CHECK (quantity_in_stock >= 0),
    minimum_stock_level INTEGER NOT NULL DEFAULT 0,
    unit_price_cents INTEGER NOT NULL CHECK (unit_price_cents >= 0),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS pharmacy_sales (
    id TEXT PRIMARY KEY,
    medication_id TEXT NOT NULL REFERENCES pharmacy_inventory(id),
    patient_id TEXT REFERENCES patients(id),
    quantity INTEGER NOT NULL CHECK (quantity > 0),
    unit_price_cents INTEGER NOT NULL,
    total_price_cents INTEGER NOT NULL,
    payment_method TEXT CHECK (payment_method IS NULL OR payment_method IN ('cash', 'credit', 'insurance', 'deposit')),
    sold_by TEXT REFERENCES profiles(id),
    sale_date TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_pharmacy_sales_medication ON pharmacy_sales(medication_id);

-- ============================================================================
-- Wards & Admissions
-- ============================================================================

CREATE TABLE IF NOT EXISTS wards (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    ward_type TEXT,
    total_beds INTEGER NOT NULL CHECK (total_beds >= 0),
    available_beds INTEGER NOT NULL
        CHECK (available_beds >= 0 AND available_beds <= total_beds),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS admissions (
    id TEXT PRIMARY KEY,
    patient_id TEXT NOT NULL REFERENCES patients(id),
    ward_id TEXT REFERENCES wards(id),
    consultation_id TEXT REFERENCES consultations(id),
    bed_number TEXT,
    admission_date TEXT NOT NULL,
    admission_reason TEXT,
    admitted_by TEXT REFERENCES profiles(id),
    discharge_date TEXT,
    discharge_reason TEXT,
    discharged_by TEXT REFERENCES profiles(id),
    status TEXT NOT NULL DEFAULT 'admitted'
        CHECK (status IN ('admitted', 'discharged', 'deceased', 'referred')),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_admissions_patient ON admissions(patient_id);
CREATE INDEX IF NOT EXISTS idx_admissions_status ON admissions(status);

-- ============================================================================
-- Specialty Records
-- ============================================================================

CREATE TABLE IF NOT EXISTS maternity_records (
    id TEXT PRIMARY KEY,
    patient_id TEXT NOT NULL REFERENCES patients(id),
    doctor_id TEXT REFERENCES profiles(id),
    visit_type TEXT NOT NULL CHECK (visit_type IN ('antenatal', 'delivery')),
    gestational_age_weeks INTEGER,
    weight_kg REAL,
    blood_pressure TEXT,
    fetal_heart_rate INTEGER,
    fundal_height_cm REAL,
    delivery_date TEXT,
    baby_weight_kg REAL,
    birth_outcome TEXT,
    notes TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_maternity_patient ON maternity_records(patient_id);

CREATE TABLE IF NOT EXISTS optical_records (
    id TEXT PRIMARY KEY,
    patient_id TEXT NOT NULL REFERENCES patients(id),
    doctor_id TEXT REFERENCES profiles(id),
    visual_acuity_od_distance TEXT,
    visual_acuity_os_distance TEXT,
    visual_acuity_od_near TEXT,
    visual_acuity_os_near TEXT,
    prescription_od TEXT NOT NULL DEFAULT '{}',  -- JSON EyePrescription
    prescription_os TEXT NOT NULL DEFAULT '{}',  -- JSON EyePrescription
    pd_distance REAL,
    next_visit_date TEXT,
    notes TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_optical_patient ON optical_records(patient_id);

CREATE TABLE IF NOT EXISTS optical_inventory (
    id TEXT PRIMARY KEY,
    item_name TEXT NOT NULL,
    item_type TEXT NOT NULL,
    brand TEXT,
    stock_quantity INTEGER NOT NULL DEFAULT 0 CHECK (stock_quantity >= 0),
    unit_price_cents INTEGER NOT NULL CHECK (unit_price_cents >= 0),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
"#;
