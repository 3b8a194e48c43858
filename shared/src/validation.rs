//! Required-field checks run on every submit attempt.

use crate::model::{CarField, CarForm, CarStatus, ValidationErrors};

/// Checks every required field in [`CarField::REQUIRED`] order and collects
/// one message per missing field. The image is optional.
#[must_use]
pub fn validate_required(form: &CarForm) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    for field in CarField::REQUIRED {
        if is_missing(form, field) {
            errors.insert(field, field.required_message());
        }
    }
    errors
}

fn is_missing(form: &CarForm, field: CarField) -> bool {
    match field {
        CarField::Brand => form.brand.is_empty(),
        CarField::Model => form.model.is_empty(),
        CarField::Description => form.description.is_empty(),
        CarField::Year => is_blank_number(form, &form.year, field),
        CarField::RentalRate => is_blank_number(form, &form.rental_rate, field),
        CarField::BranchId => form.branch_id.as_ref().map_or(true, |id| id.is_blank()),
        CarField::Status => form.status == CarStatus::Unset,
    }
}

// A fetched `0` is falsy until the user edits the field.
fn is_blank_number(form: &CarForm, raw: &str, field: CarField) -> bool {
    raw.is_empty() || form.fetched_zero.contains(&field)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Identifier, ImageFile};
    use proptest::prelude::*;

    fn complete_form() -> CarForm {
        CarForm {
            brand: "Toyota".into(),
            model: "Corolla".into(),
            year: "2020".into(),
            description: "Compact sedan".into(),
            rental_rate: "49.99".into(),
            branch_id: Some(Identifier::from("B1")),
            status: CarStatus::Approved,
            ..CarForm::default()
        }
    }

    fn blank(form: &mut CarForm, field: CarField) {
        match field {
            CarField::Brand => form.brand.clear(),
            CarField::Model => form.model.clear(),
            CarField::Year => form.year.clear(),
            CarField::Description => form.description.clear(),
            CarField::RentalRate => form.rental_rate.clear(),
            CarField::BranchId => form.branch_id = None,
            CarField::Status => form.status = CarStatus::Unset,
        }
    }

    #[test]
    fn complete_form_is_valid() {
        assert!(validate_required(&complete_form()).is_empty());
    }

    #[test]
    fn empty_form_reports_every_field_in_order() {
        let errors = validate_required(&CarForm::default());
        let fields: Vec<_> = errors.fields().collect();
        assert_eq!(fields, CarField::REQUIRED.to_vec());

        let messages: Vec<_> = errors.iter().map(|(_, m)| m).collect();
        assert_eq!(
            messages,
            [
                "Brand is required",
                "Model is required",
                "Year is required",
                "Description is required",
                "Rental Rate is required",
                "Branch is required",
                "Status is required",
            ]
        );
    }

    #[test]
    fn image_is_not_required() {
        let mut form = complete_form();
        form.image = None;
        assert!(validate_required(&form).is_empty());

        form.image = Some(ImageFile::new("car.jpg", vec![0xFF, 0xD8, 0xFF]));
        assert!(validate_required(&form).is_empty());
    }

    #[test]
    fn fetched_zero_counts_as_missing() {
        let mut form = complete_form();
        form.year = "0".into();
        form.rental_rate = "0".into();
        form.fetched_zero = vec![CarField::Year, CarField::RentalRate];
        let errors = validate_required(&form);
        assert!(errors.contains(CarField::Year));
        assert!(errors.contains(CarField::RentalRate));
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn typed_zero_is_a_value() {
        let mut form = complete_form();
        form.fetched_zero = vec![CarField::Year];
        form.set_field(CarField::Year, "0".into()).unwrap();
        form.set_field(CarField::RentalRate, "0.0".into()).unwrap();
        assert!(validate_required(&form).is_empty());
    }

    #[test]
    fn whitespace_is_not_empty() {
        let mut form = complete_form();
        form.brand = " ".into();
        assert!(validate_required(&form).is_empty());
    }

    #[test]
    fn blank_branch_identifiers_are_missing() {
        let mut form = complete_form();
        form.branch_id = Some(Identifier::from(""));
        assert!(validate_required(&form).contains(CarField::BranchId));

        form.branch_id = Some(Identifier::Number(0));
        assert!(validate_required(&form).contains(CarField::BranchId));

        form.branch_id = Some(Identifier::Number(3));
        assert!(validate_required(&form).is_empty());
    }

    proptest! {
        #[test]
        fn only_blanked_fields_are_reported(mask in proptest::collection::vec(any::<bool>(), 7)) {
            let mut form = complete_form();
            let mut expected = Vec::new();
            for (field, blanked) in CarField::REQUIRED.into_iter().zip(mask) {
                if blanked {
                    blank(&mut form, field);
                    expected.push(field);
                }
            }

            let errors = validate_required(&form);
            let reported: Vec<_> = errors.fields().collect();
            prop_assert_eq!(&reported, &expected);
            for field in expected {
                let message = field.required_message();
                prop_assert_eq!(errors.get(field), Some(message.as_str()));
            }
        }
    }
}
