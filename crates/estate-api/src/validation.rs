use estate_types::api::{
    CreateAdminRequest, PropertyInput, PropertyPatch, SignupRequest, UpdateAdminRequest,
};

use crate::error::{ApiError, FieldErrors};

pub const MIN_PASSWORD_LEN: usize = 8;

/// Collects per-field problems; empty means valid.
#[derive(Default)]
struct Checks(FieldErrors);

impl Checks {
    fn fail(&mut self, field: &str, message: &str) {
        self.0.entry(field.to_string()).or_insert_with(|| message.to_string());
    }

    fn finish(self) -> Result<(), ApiError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(self.0))
        }
    }

    fn email(&mut self, email: &str) {
        if email.trim().is_empty() {
            self.fail("email", "Email is required");
        } else if !looks_like_email(email.trim()) {
            self.fail("email", "Please enter a valid email");
        }
    }

    fn password(&mut self, password: &str) {
        if password.is_empty() {
            self.fail("password", "Password is required");
        } else if password.chars().count() < MIN_PASSWORD_LEN {
            self.fail("password", "Password must be at least 8 characters");
        }
    }

    fn required(&mut self, field: &str, value: &str, message: &str) {
        if value.trim().is_empty() {
            self.fail(field, message);
        }
    }

    fn price(&mut self, price: f64) {
        if !price.is_finite() || price <= 0.0 {
            self.fail("price", "Price must be greater than 0");
        }
    }

    fn count(&mut self, field: &str, value: Option<i64>) {
        if value.is_some_and(|v| v < 0) {
            self.fail(field, "Must not be negative");
        }
    }

    fn sqft(&mut self, value: Option<i64>) {
        if value.is_some_and(|v| v <= 0) {
            self.fail("sqft", "Square footage must be greater than 0");
        }
    }

    fn mobile(&mut self, value: Option<&str>) {
        if let Some(mobile) = value.map(str::trim).filter(|m| !m.is_empty()) {
            if !is_mobile_number(mobile) {
                self.fail("mobile_number", "Mobile number must be 10 digits");
            }
        }
    }

    fn coordinates(&mut self, latitude: Option<f64>, longitude: Option<f64>) {
        if latitude.is_some_and(|lat| !(-90.0..=90.0).contains(&lat)) {
            self.fail("latitude", "Latitude must be between -90 and 90");
        }
        if longitude.is_some_and(|lng| !(-180.0..=180.0).contains(&lng)) {
            self.fail("longitude", "Longitude must be between -180 and 180");
        }
    }
}

/// `something@domain.tld` with no whitespace.
fn looks_like_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.rsplit_once('@') else {
        return false;
    };
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    !local.is_empty() && !host.is_empty() && !tld.is_empty()
}

/// Exactly ten ASCII digits.
pub fn is_mobile_number(value: &str) -> bool {
    value.len() == 10 && value.bytes().all(|b| b.is_ascii_digit())
}

pub fn signup(req: &SignupRequest) -> Result<(), ApiError> {
    let mut checks = Checks::default();
    checks.email(&req.email);
    checks.password(&req.password);
    checks.required("full_name", &req.full_name, "Full name is required");
    if let Some(phone) = req.phone.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
        if !is_mobile_number(phone) {
            checks.fail("phone", "Phone number must be 10 digits");
        }
    }
    checks.finish()
}

pub fn property(input: &PropertyInput) -> Result<(), ApiError> {
    let mut checks = Checks::default();
    checks.required("title", &input.title, "Title is required");
    checks.required("address", &input.address, "Address is required");
    checks.price(input.price);
    checks.count("beds", input.beds);
    checks.count("baths", input.baths);
    checks.sqft(input.sqft);
    checks.mobile(input.mobile_number.as_deref());
    checks.coordinates(input.latitude, input.longitude);
    checks.finish()
}

/// Same rules as [`property`], applied only to the fields the patch sets.
pub fn property_patch(patch: &PropertyPatch) -> Result<(), ApiError> {
    let mut checks = Checks::default();
    if let Some(title) = &patch.title {
        checks.required("title", title, "Title is required");
    }
    if let Some(address) = &patch.address {
        checks.required("address", address, "Address is required");
    }
    if let Some(price) = patch.price {
        checks.price(price);
    }
    checks.count("beds", patch.beds.flatten());
    checks.count("baths", patch.baths.flatten());
    checks.sqft(patch.sqft.flatten());
    checks.mobile(patch.mobile_number.as_ref().and_then(|m| m.as_deref()));
    checks.coordinates(patch.latitude.flatten(), patch.longitude.flatten());
    if patch.views_count.is_some_and(|v| v < 0) {
        checks.fail("views_count", "Must not be negative");
    }
    checks.finish()
}

pub fn create_admin(req: &CreateAdminRequest) -> Result<(), ApiError> {
    let mut checks = Checks::default();
    checks.email(&req.email);
    checks.required("name", &req.name, "Name is required");
    checks.password(&req.password);
    checks.finish()
}

pub fn update_admin(req: &UpdateAdminRequest) -> Result<(), ApiError> {
    let mut checks = Checks::default();
    checks.required("name", &req.name, "Name is required");
    if let Some(password) = req.password.as_deref().filter(|p| !p.is_empty()) {
        checks.password(password);
    }
    checks.finish()
}
