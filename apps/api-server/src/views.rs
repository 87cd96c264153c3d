//! HTML rendering for the pet form and owner pages.
//!
//! Markup is produced with `format!` and every interpolated value goes through
//! `http_common::html_escape`.

use domain::service::PetFormView;
use domain::{Owner, Pet};
use http_common::html_escape;

fn layout(title: &str, body: &str) -> String {
    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>PetClinic :: {title}</title>
  <style>
    body {{ font-family: system-ui, sans-serif; max-width: 40rem; margin: 2rem auto; padding: 0 1rem; }}
    .form-group {{ margin-bottom: 1rem; }}
    .has-error input, .has-error select {{ border-color: #b00; }}
    .help-inline {{ color: #b00; font-size: 0.9rem; display: block; }}
    table {{ border-collapse: collapse; width: 100%; }}
    th, td {{ text-align: left; padding: 0.3rem 0.5rem; border-bottom: 1px solid #ddd; }}
  </style>
</head>
<body>
{body}
</body>
</html>"##,
        title = html_escape(title),
        body = body,
    )
}

fn field_errors_html(view: &PetFormView, field: &str) -> String {
    view.errors
        .field_errors(field)
        .map(|e| format!(r#"<span class="help-inline">{}</span>"#, html_escape(&e.message)))
        .collect()
}

fn group_class(view: &PetFormView, field: &str) -> &'static str {
    if view.errors.has_field_errors(field) {
        "form-group has-error"
    } else {
        "form-group"
    }
}

/// Render the shared create/update pet form.
pub fn render_pet_form(view: &PetFormView) -> String {
    let owner_id = view.owner.id.as_str();
    let (heading, action, button) = match &view.pet.id {
        None => ("New Pet", http_common::new_pet_path(owner_id), "Add Pet"),
        Some(id) => (
            "Pet",
            http_common::edit_pet_path(owner_id, id.as_str()),
            "Update Pet",
        ),
    };

    let options: String = view
        .types
        .iter()
        .map(|t| {
            let selected = if view.pet.pet_type == Some(*t) {
                " selected"
            } else {
                ""
            };
            format!(
                r#"<option value="{v}"{selected}>{v}</option>"#,
                v = t.as_str(),
                selected = selected
            )
        })
        .collect::<Vec<_>>()
        .join("\n        ");

    let body = format!(
        r#"<h2>{heading}</h2>
<form method="post" action="{action}" id="add-pet-form">
  <div class="form-group">
    <label>Owner</label>
    <span>{owner}</span>
  </div>
  <div class="{name_class}">
    <label for="name">Name</label>
    <input id="name" name="name" type="text" value="{name}">
    {name_errors}
  </div>
  <div class="{type_class}">
    <label for="type">Type</label>
    <select id="type" name="type">
        <option value="">--</option>
        {options}
    </select>
    {type_errors}
  </div>
  <button type="submit">{button}</button>
</form>"#,
        heading = heading,
        action = html_escape(&action),
        owner = html_escape(&view.owner.full_name()),
        name_class = group_class(view, "name"),
        name = html_escape(&view.pet.name),
        name_errors = field_errors_html(view, "name"),
        type_class = group_class(view, "type"),
        options = options,
        type_errors = field_errors_html(view, "type"),
        button = button,
    );
    layout(heading, &body)
}

/// Render the owner details page with the owner's pets.
pub fn render_owner_details(owner: &Owner, pets: &[Pet]) -> String {
    let owner_id = owner.id.as_str();
    let rows: String = pets
        .iter()
        .map(|p| {
            let edit = p
                .id
                .as_ref()
                .map(|id| {
                    format!(
                        r#"<a href="{}">Edit Pet</a>"#,
                        html_escape(&http_common::edit_pet_path(owner_id, id.as_str()))
                    )
                })
                .unwrap_or_default();
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                html_escape(&p.name),
                p.pet_type.map(|t| t.as_str()).unwrap_or(""),
                edit
            )
        })
        .collect();

    let body = format!(
        r#"<h2>Owner Information</h2>
<table>
  <tr><th>Name</th><td><b>{name}</b></td></tr>
  <tr><th>Address</th><td>{address}</td></tr>
  <tr><th>City</th><td>{city}</td></tr>
  <tr><th>Telephone</th><td>{telephone}</td></tr>
</table>
<p><a href="{new_pet}">Add New Pet</a></p>
<h2>Pets</h2>
<table id="pets">
  <tr><th>Name</th><th>Type</th><th></th></tr>
{rows}</table>"#,
        name = html_escape(&owner.full_name()),
        address = html_escape(&owner.address),
        city = html_escape(&owner.city),
        telephone = html_escape(&owner.telephone),
        new_pet = html_escape(&http_common::new_pet_path(owner_id)),
        rows = rows,
    );
    layout("Owner", &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::validate::BindingResult;
    use domain::{OwnerId, PetId, PetType};

    fn owner() -> Owner {
        Owner::new(OwnerId::new("1").unwrap(), "George", "Franklin")
    }

    fn view(pet: Pet, errors: BindingResult) -> PetFormView {
        PetFormView {
            owner: owner(),
            pet,
            types: PetType::ALL.to_vec(),
            errors,
        }
    }

    #[test]
    fn new_form_posts_to_creation_path() {
        let html = render_pet_form(&view(Pet::new(owner().id), BindingResult::new()));
        assert!(html.contains(r#"action="/owners/1/pets/new""#));
        assert!(html.contains("Add Pet"));
        for t in ["cat", "dog", "lizard", "snake", "bird", "hamster"] {
            assert!(html.contains(&format!(r#"<option value="{t}">"#)));
        }
    }

    #[test]
    fn edit_form_keeps_values_and_errors() {
        let mut pet = Pet::new(owner().id);
        pet.id = Some(PetId::new("7").unwrap());
        pet.name = "<Rex>".into();
        pet.pet_type = Some(PetType::Dog);
        let mut errors = BindingResult::new();
        errors.reject_value("name", "duplicate", "already exists");

        let html = render_pet_form(&view(pet, errors));
        assert!(html.contains(r#"action="/owners/1/pets/7/edit""#));
        assert!(html.contains(r#"value="&lt;Rex&gt;""#));
        assert!(html.contains(r#"<option value="dog" selected>"#));
        assert!(html.contains("already exists"));
        assert!(html.contains("Update Pet"));
    }

    #[test]
    fn owner_page_lists_pets_with_edit_links() {
        let mut pet = Pet::new(owner().id);
        pet.id = Some(PetId::new("3").unwrap());
        pet.name = "Leo".into();
        pet.pet_type = Some(PetType::Cat);
        let html = render_owner_details(&owner(), &[pet]);
        assert!(html.contains("George Franklin"));
        assert!(html.contains("<td>Leo</td><td>cat</td>"));
        assert!(html.contains(r#"href="/owners/1/pets/3/edit""#));
    }
}
